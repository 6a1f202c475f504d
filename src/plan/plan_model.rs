use serde::{Deserialize, Serialize};

use crate::component::component_model::Component;

// ============================================================================
// Operations emitted by the semantic planner
// ============================================================================

/// One structural edit over raw detector indices. The planner never supplies
/// coordinates here; geometry is always derived from the referenced indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Operation {
    /// Fuse the referenced detections into one logical widget
    Merge {
        #[serde(default)]
        indices: Vec<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_class: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_text: Option<String>,
        #[serde(default)]
        reason: String,
    },
    /// Drop duplicate or noise detections
    Delete {
        #[serde(default)]
        indices: Vec<usize>,
        #[serde(default)]
        reason: String,
    },
    /// Pass detections through unchanged
    Keep {
        #[serde(default)]
        indices: Vec<usize>,
        #[serde(default)]
        reason: String,
    },
    /// Any action string this engine does not understand
    #[serde(other)]
    Unknown,
}

impl Operation {
    pub fn indices(&self) -> &[usize] {
        match self {
            Operation::Merge { indices, .. }
            | Operation::Delete { indices, .. }
            | Operation::Keep { indices, .. } => indices,
            Operation::Unknown => &[],
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Operation::Merge { reason, .. }
            | Operation::Delete { reason, .. }
            | Operation::Keep { reason, .. } => reason,
            Operation::Unknown => "",
        }
    }

    pub fn merge(indices: &[usize], target_class: Option<&str>, target_text: Option<&str>) -> Self {
        Operation::Merge {
            indices: indices.to_vec(),
            target_class: target_class.map(str::to_string),
            target_text: target_text.map(str::to_string),
            reason: String::new(),
        }
    }

    pub fn delete(indices: &[usize], reason: &str) -> Self {
        Operation::Delete {
            indices: indices.to_vec(),
            reason: reason.to_string(),
        }
    }

    pub fn keep(indices: &[usize], reason: &str) -> Self {
        Operation::Keep {
            indices: indices.to_vec(),
            reason: reason.to_string(),
        }
    }
}

// ============================================================================
// Planner reply formats
// ============================================================================

/// What the planner sent back. Two formats exist and each has its own code
/// path: index-based operations (current) and full components with the
/// planner's own coordinates (legacy). Replies are read by
/// `plan::response::parse_planner_value`, which picks the format by key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlannerResponse {
    Operations {
        /// Free-form page description; diagnostics only
        #[serde(default)]
        page_analysis: serde_json::Value,
        operations: Vec<Operation>,
    },
    Legacy {
        components: Vec<Component>,
        #[serde(default)]
        merge_log: Vec<serde_json::Value>,
    },
}

impl PlannerResponse {
    pub fn operations(operations: Vec<Operation>) -> Self {
        PlannerResponse::Operations {
            page_analysis: serde_json::Value::Null,
            operations,
        }
    }

    pub fn format_name(&self) -> &'static str {
        match self {
            PlannerResponse::Operations { .. } => "operations",
            PlannerResponse::Legacy { .. } => "legacy_components",
        }
    }
}

/// Result of asking the planner, as seen by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerOutcome {
    Response(PlannerResponse),
    /// Planner absent or failed; carries the reason for the degraded result
    Unavailable(String),
}

impl<E: std::fmt::Display> From<Result<PlannerResponse, E>> for PlannerOutcome {
    fn from(result: Result<PlannerResponse, E>) -> Self {
        match result {
            Ok(response) => PlannerOutcome::Response(response),
            Err(e) => PlannerOutcome::Unavailable(e.to_string()),
        }
    }
}
