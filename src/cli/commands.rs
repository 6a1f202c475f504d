use std::path::Path;

use serde::de::DeserializeOwned;

use crate::align::validator::AlignmentValidator;
use crate::cli::config::AppConfig;
use crate::component::component_model::RawComponentSet;
use crate::error::FusionResult;
use crate::pipeline::fusion::fuse;
use crate::pipeline::ui_json::{ModelInfo, UiDocument};
use crate::plan::plan_model::PlannerOutcome;
use crate::plan::planner::{PlanRequest, SemanticPlanner, VlmPlanner, mime_type_for};
use crate::plan::response::parse_planner_reply;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

// ============================================================================
// apply subcommand
// ============================================================================

pub fn cmd_apply(
    raw_path: &str,
    plan_path: Option<&str>,
    output: Option<&str>,
    source: Option<&str>,
    pretty: bool,
    config: &AppConfig,
    tracer: &TraceLogger,
) -> FusionResult<()> {
    let raw: RawComponentSet = read_json(raw_path)?;
    let outcome = load_plan(plan_path);

    let source = source.map(str::to_string).unwrap_or_else(|| file_name(raw_path));
    let doc = run_fusion(&source, &raw, outcome, None, config, tracer);
    write_output(&doc, output, pretty)
}

/// Read a saved planner reply. Any failure becomes a degraded outcome.
pub fn load_plan(plan_path: Option<&str>) -> PlannerOutcome {
    let Some(path) = plan_path else {
        return PlannerOutcome::Unavailable("no planner reply supplied".to_string());
    };

    match std::fs::read_to_string(path) {
        Ok(content) => parse_planner_reply(&content).into(),
        Err(e) => PlannerOutcome::Unavailable(format!("cannot read {}: {}", path, e)),
    }
}

// ============================================================================
// fuse subcommand
// ============================================================================

pub fn cmd_fuse(
    image_path: &str,
    raw_path: &str,
    output: Option<&str>,
    endpoint: Option<&str>,
    model: Option<&str>,
    pretty: bool,
    config: &AppConfig,
    tracer: &TraceLogger,
) -> FusionResult<()> {
    let raw: RawComponentSet = read_json(raw_path)?;
    let image = std::fs::read(image_path)?;

    let endpoint = endpoint.unwrap_or(config.planner.endpoint.as_str());
    let model = model.unwrap_or(config.planner.model.as_str());
    let planner = VlmPlanner::new(
        endpoint,
        model,
        config.planner.api_key(),
        config.planner.timeout(),
        config.planner.retry_policy(),
    )?;

    let request = PlanRequest {
        image: &image,
        mime_type: mime_type_for(image_path),
        raw: &raw,
    };
    let outcome: PlannerOutcome = planner.plan(&request).into();

    let models = ModelInfo {
        detection: None,
        semantic_filter: Some(model.to_string()),
    };
    let doc = run_fusion(&file_name(image_path), &raw, outcome, Some(models), config, tracer);
    write_output(&doc, output, pretty)
}

// ============================================================================
// align subcommand
// ============================================================================

pub fn cmd_align(
    final_path: &str,
    raw_path: &str,
    output: Option<&str>,
    pretty: bool,
    config: &AppConfig,
) -> FusionResult<()> {
    let mut doc: UiDocument = read_json(final_path)?;
    let raw: RawComponentSet = read_json(raw_path)?;

    let validator = AlignmentValidator::new(config.alignment.clone());
    let report = validator.validate(&mut doc.components, &raw);
    if !report.is_noop() {
        doc.metadata.processing.alignment = Some(report);
    }

    write_output(&doc, output, pretty)
}

// ============================================================================
// Helpers
// ============================================================================

/// Fuse, record a trace event, and wrap the result as a UI-JSON document.
pub fn run_fusion(
    source: &str,
    raw: &RawComponentSet,
    outcome: PlannerOutcome,
    models: Option<ModelInfo>,
    config: &AppConfig,
    tracer: &TraceLogger,
) -> UiDocument {
    let output = fuse(raw, outcome, &config.fusion_config());
    tracer.record(&TraceEvent::now(source).with_output(raw.components.len(), &output));

    tracing::info!(
        source = %source,
        raw = raw.components.len(),
        result = output.components.len(),
        degraded = output.degraded.is_some(),
        "fusion finished"
    );
    UiDocument::build(source, raw, output, models)
}

pub fn read_json<T: DeserializeOwned>(path: &str) -> FusionResult<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_output(doc: &UiDocument, output: Option<&str>, pretty: bool) -> FusionResult<()> {
    let json = doc.to_json(pretty)?;
    match output {
        Some(path) => std::fs::write(path, &json)?,
        None => println!("{}", json),
    }
    Ok(())
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
