use std::time::Duration;

use screen_fusion::plan::plan_model::{Operation, PlannerOutcome, PlannerResponse};
use screen_fusion::plan::planner::{
    MockPlanner, PlanRequest, SemanticPlanner, VlmPlanner, mime_type_for, request_fingerprint,
    summarize_components,
};
use screen_fusion::plan::response::{extract_json, parse_planner_reply};
use screen_fusion::plan::retry::RetryPolicy;

use crate::common::fixtures::price_scenario;

mod common;

const OPERATIONS_REPLY: &str = r#"{
  "page_analysis": {"app_type": "shopping", "regions": [{"name": "price"}]},
  "operations": [
    {"action": "merge", "indices": [0, 1], "target_class": "Label", "reason": "price"},
    {"action": "delete", "indices": [2], "reason": "noise"},
    {"action": "keep", "indices": [3], "reason": "button"}
  ]
}"#;

// =========================================================================
// JSON extraction
// =========================================================================

#[test]
fn extract_plain_json() {
    let value = extract_json(r#"  {"a": 1}  "#).unwrap();
    assert_eq!(value["a"], 1);
}

#[test]
fn extract_fenced_json() {
    let reply = "Here is the plan:\n```json\n{\"operations\": []}\n```\nDone.";
    let value = extract_json(reply).unwrap();
    assert!(value["operations"].is_array());
}

#[test]
fn extract_braced_span_from_prose() {
    let reply = "Sure! {\"operations\": [{\"action\": \"keep\", \"indices\": [1]}]} hope that helps";
    let value = extract_json(reply).unwrap();
    assert_eq!(value["operations"][0]["action"], "keep");
}

#[test]
fn extract_fails_without_json() {
    assert!(extract_json("I cannot help with that.").is_err());
}

// =========================================================================
// Reply formats
// =========================================================================

#[test]
fn operations_reply_parses_into_operations_variant() {
    let response = parse_planner_reply(OPERATIONS_REPLY).unwrap();

    match response {
        PlannerResponse::Operations {
            page_analysis,
            operations,
        } => {
            assert_eq!(page_analysis["app_type"], "shopping");
            assert_eq!(operations.len(), 3);
            assert_eq!(
                operations[0],
                Operation::Merge {
                    indices: vec![0, 1],
                    target_class: Some("Label".into()),
                    target_text: None,
                    reason: "price".into(),
                }
            );
            assert_eq!(operations[1], Operation::delete(&[2], "noise"));
            assert_eq!(operations[2], Operation::keep(&[3], "button"));
        }
        other => panic!("Expected operations, got {:?}", other),
    }
}

#[test]
fn legacy_reply_parses_into_legacy_variant() {
    let reply = r#"{
      "components": [
        {"class": "Button", "bounds": {"x": 1, "y": 2, "width": 3, "height": 4}, "text": "OK"}
      ],
      "merge_log": [{"action": "merge", "from": [1, 2]}]
    }"#;

    let response = parse_planner_reply(reply).unwrap();

    match response {
        PlannerResponse::Legacy {
            components,
            merge_log,
        } => {
            assert_eq!(components.len(), 1);
            assert_eq!(components[0].class, "Button");
            assert_eq!(components[0].text, "OK");
            assert_eq!(merge_log.len(), 1);
        }
        other => panic!("Expected legacy, got {:?}", other),
    }
}

#[test]
fn operations_key_takes_precedence_over_components() {
    let reply = r#"{"operations": [], "components": []}"#;
    let response = parse_planner_reply(reply).unwrap();
    assert_eq!(response.format_name(), "operations");

    // A broken operation list never falls back to the legacy format.
    let reply = r#"{"operations": [{"action": "merge", "indices": [-1]}], "components": []}"#;
    assert!(parse_planner_reply(reply).is_err());

    let outcome: PlannerOutcome = parse_planner_reply(reply).into();
    assert!(matches!(outcome, PlannerOutcome::Unavailable(_)));
}

#[test]
fn reply_without_either_format_is_rejected() {
    assert!(parse_planner_reply(r#"{"page_analysis": {}}"#).is_err());
    assert!(parse_planner_reply("[1, 2, 3]").is_err());
}

#[test]
fn operation_fields_default_when_missing() {
    let ops: Vec<Operation> = serde_json::from_str(r#"[{"action": "delete"}]"#).unwrap();
    assert_eq!(ops, vec![Operation::delete(&[], "")]);
}

#[test]
fn failed_reply_becomes_unavailable_outcome() {
    let outcome: PlannerOutcome = parse_planner_reply("nothing useful").into();
    assert!(matches!(outcome, PlannerOutcome::Unavailable(_)));

    let outcome: PlannerOutcome = parse_planner_reply(OPERATIONS_REPLY).into();
    assert!(matches!(outcome, PlannerOutcome::Response(_)));
}

// =========================================================================
// Retry policy
// =========================================================================

#[test]
fn retry_delays_grow_exponentially_and_cap() {
    let policy = RetryPolicy::default();
    let delays: Vec<u64> = (0..8).map(|a| policy.delay_before(a).as_secs()).collect();
    assert_eq!(delays, vec![0, 5, 10, 20, 40, 60, 60, 60]);
}

#[test]
fn retryable_statuses() {
    for status in [429, 500, 502, 503, 504] {
        assert!(RetryPolicy::is_retryable(status), "{}", status);
    }
    for status in [400, 401, 403, 404, 422, 501] {
        assert!(!RetryPolicy::is_retryable(status), "{}", status);
    }
}

#[test]
fn retry_policy_needs_at_least_one_attempt() {
    let policy = RetryPolicy::new(0, Duration::from_millis(10), Duration::from_millis(100));
    assert_eq!(policy.max_attempts, 1);
}

// =========================================================================
// Planner boundary
// =========================================================================

#[test]
fn mock_planner_returns_parsed_reply() {
    let raw = price_scenario();
    let planner = MockPlanner::with_reply(&format!("```json\n{}\n```", OPERATIONS_REPLY));
    let request = PlanRequest {
        image: b"fake-png",
        mime_type: "image/png",
        raw: &raw,
    };

    let response = planner.plan(&request).unwrap();
    assert_eq!(response.format_name(), "operations");
}

#[test]
fn summary_lists_every_component() {
    let raw = price_scenario();
    let summary: serde_json::Value = serde_json::from_str(&summarize_components(&raw)).unwrap();

    let entries = summary.as_array().unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[1]["index"], 1);
    assert_eq!(entries[1]["text"], "199");
    assert_eq!(entries[1]["bounds"], serde_json::json!([125, 500, 60, 30]));
}

#[test]
fn fingerprint_depends_on_image_and_summary() {
    let a = request_fingerprint(b"image-a", "[]");
    assert_eq!(a, request_fingerprint(b"image-a", "[]"));
    assert_ne!(a, request_fingerprint(b"image-b", "[]"));
    assert_ne!(a, request_fingerprint(b"image-a", "[{}]"));
    assert_eq!(a.len(), 40);
}

#[test]
fn new_planner_starts_with_empty_cache() {
    let planner = VlmPlanner::new(
        "http://localhost:9/v1/chat/completions",
        "test-model",
        None,
        Duration::from_secs(1),
        RetryPolicy::default(),
    )
    .unwrap();
    assert_eq!(planner.cache_len(), 0);
}

#[test]
fn mime_types_from_extension() {
    assert_eq!(mime_type_for("shot.PNG"), "image/png");
    assert_eq!(mime_type_for("shot.jpeg"), "image/jpeg");
    assert_eq!(mime_type_for("shot.webp"), "image/webp");
    assert_eq!(mime_type_for("shot"), "image/png");
}
