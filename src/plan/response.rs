use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::component::component_model::Component;
use crate::error::{FusionError, FusionResult};
use crate::plan::plan_model::{Operation, PlannerResponse};

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("valid fence regex"));

static BRACED_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid brace regex"));

/// Pull a JSON value out of a reasoner's free-text reply.
///
/// Tries, in order: the whole reply, the first fenced code block, and the
/// span from the first `{` to the last `}`.
pub fn extract_json(content: &str) -> FusionResult<serde_json::Value> {
    if let Ok(value) = serde_json::from_str(content.trim()) {
        return Ok(value);
    }

    if let Some(block) = FENCED_JSON.captures(content).and_then(|c| c.get(1)) {
        if let Ok(value) = serde_json::from_str(block.as_str()) {
            return Ok(value);
        }
    }

    if let Some(span) = BRACED_SPAN.find(content) {
        return serde_json::from_str(span.as_str()).map_err(FusionError::from);
    }

    Err(FusionError::NoJson(preview(content, 200)))
}

/// Parse a reasoner reply into one of the two planner formats.
pub fn parse_planner_reply(content: &str) -> FusionResult<PlannerResponse> {
    let value = extract_json(content)?;
    parse_planner_value(value)
}

#[derive(Deserialize)]
struct OperationsReply {
    #[serde(default)]
    page_analysis: serde_json::Value,
    operations: Vec<Operation>,
}

#[derive(Deserialize)]
struct LegacyReply {
    components: Vec<Component>,
    #[serde(default)]
    merge_log: Vec<serde_json::Value>,
}

/// Pick the reply format by key. A reply carrying `operations` is only ever
/// read as operations, so a malformed operation list is an error even when
/// `components` is also present.
pub fn parse_planner_value(value: serde_json::Value) -> FusionResult<PlannerResponse> {
    let Some(object) = value.as_object() else {
        return Err(FusionError::Planner(
            "planner reply is not a JSON object".to_string(),
        ));
    };

    if object.contains_key("operations") {
        let reply: OperationsReply = serde_json::from_value(value)?;
        return Ok(PlannerResponse::Operations {
            page_analysis: reply.page_analysis,
            operations: reply.operations,
        });
    }

    if object.contains_key("components") {
        let reply: LegacyReply = serde_json::from_value(value)?;
        return Ok(PlannerResponse::Legacy {
            components: reply.components,
            merge_log: reply.merge_log,
        });
    }

    Err(FusionError::Planner(
        "planner reply has neither `operations` nor `components`".to_string(),
    ))
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}
