use serde::{Deserialize, Serialize};

use crate::align::validator::{AlignmentConfig, AlignmentReport, AlignmentValidator};
use crate::bounds::resolver::{BoundsConfig, BoundsResolver};
use crate::component::component_model::{Component, RawComponentSet};
use crate::component::geometry::canonical_order;
use crate::consolidate::engine::apply_operations;
use crate::consolidate::op_log::OperationLog;
use crate::plan::plan_model::{Operation, PlannerOutcome, PlannerResponse};

/// Tunables for the deterministic stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    #[serde(default)]
    pub alignment: AlignmentConfig,
    #[serde(default)]
    pub bounds: BoundsConfig,
}

/// Which code path produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionPath {
    Operations,
    LegacyComponents,
    RawFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FusionOutput {
    pub path: FusionPath,
    /// Final components in reading order, indexed from 0
    pub components: Vec<Component>,
    /// Engine audit trail (operations path only)
    pub log: OperationLog,
    /// Free-form log the planner sent with a legacy reply
    pub planner_log: Vec<serde_json::Value>,
    pub alignment: AlignmentReport,
    /// Why the planner's edits were not applied, if they weren't
    pub degraded: Option<String>,
}

// ============================================================================
// fuse: dispatch on the planner's reply format
// ============================================================================

/// Turn raw detections plus whatever the planner produced into the final
/// component set. Never fails: a missing or failed plan yields the raw
/// detections in reading order.
pub fn fuse(raw: &RawComponentSet, outcome: PlannerOutcome, config: &FusionConfig) -> FusionOutput {
    match outcome {
        PlannerOutcome::Response(PlannerResponse::Operations { operations, .. }) => {
            fuse_operations(raw, &operations, config)
        }
        PlannerOutcome::Response(PlannerResponse::Legacy {
            components,
            merge_log,
        }) => fuse_legacy(raw, components, merge_log, config),
        PlannerOutcome::Unavailable(reason) => raw_fallback(raw, reason),
    }
}

/// Index-based operations: consolidate, then repair text drift.
pub fn fuse_operations(
    raw: &RawComponentSet,
    operations: &[Operation],
    config: &FusionConfig,
) -> FusionOutput {
    let consolidated = apply_operations(operations, raw);
    let mut components = consolidated.components;

    let validator = AlignmentValidator::new(config.alignment.clone());
    let alignment = validator.validate(&mut components, raw);

    FusionOutput {
        path: FusionPath::Operations,
        components,
        log: consolidated.log,
        planner_log: Vec::new(),
        alignment,
        degraded: None,
    }
}

/// Planner-authored components: distrust their bounds, restore reading
/// order, then repair text drift.
pub fn fuse_legacy(
    raw: &RawComponentSet,
    planner_components: Vec<Component>,
    planner_log: Vec<serde_json::Value>,
    config: &FusionConfig,
) -> FusionOutput {
    tracing::warn!(
        components = planner_components.len(),
        "planner returned legacy components, re-deriving bounds"
    );

    let resolver = BoundsResolver::new(raw, config.bounds.clone());
    let mut components = resolver.resolve(planner_components);
    canonical_order(&mut components);

    let validator = AlignmentValidator::new(config.alignment.clone());
    let alignment = validator.validate(&mut components, raw);

    FusionOutput {
        path: FusionPath::LegacyComponents,
        components,
        log: OperationLog::default(),
        planner_log,
        alignment,
        degraded: None,
    }
}

/// Raw detections verbatim, sorted and reindexed.
pub fn raw_fallback(raw: &RawComponentSet, reason: String) -> FusionOutput {
    tracing::warn!(reason = %reason, "planner unavailable, falling back to raw detections");

    let mut components = raw.components.clone();
    canonical_order(&mut components);

    FusionOutput {
        path: FusionPath::RawFallback,
        components,
        log: OperationLog::default(),
        planner_log: Vec::new(),
        alignment: AlignmentReport::unchanged(),
        degraded: Some(reason),
    }
}
