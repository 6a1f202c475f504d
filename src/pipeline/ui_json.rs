use serde::{Deserialize, Serialize};

use crate::align::validator::AlignmentReport;
use crate::component::component_model::{Component, RawComponentSet};
use crate::pipeline::fusion::{FusionOutput, FusionPath};

pub const EXTRACTION_METHOD: &str = "detector+planner_fusion";

// ============================================================================
// Final UI-JSON document handed to renderers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Processing {
    pub omni_raw_count: usize,
    pub final_count: usize,
    #[serde(default)]
    pub merge_log: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<FusionPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignmentReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub source: String,
    #[serde(default)]
    pub extraction_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<ModelInfo>,
    pub resolution: Resolution,
    pub processing: Processing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiDocument {
    pub metadata: Metadata,
    pub components: Vec<Component>,
    #[serde(rename = "componentCount")]
    pub component_count: usize,
}

impl UiDocument {
    /// Wrap a fusion result with provenance metadata.
    pub fn build(
        source: &str,
        raw: &RawComponentSet,
        output: FusionOutput,
        models: Option<ModelInfo>,
    ) -> Self {
        let merge_log = if output.planner_log.is_empty() {
            output
                .log
                .iter()
                .filter_map(|e| serde_json::to_value(e).ok())
                .collect()
        } else {
            output.planner_log
        };

        let alignment = (!output.alignment.is_noop()).then_some(output.alignment);
        let component_count = output.components.len();

        UiDocument {
            metadata: Metadata {
                source: source.to_string(),
                extraction_method: EXTRACTION_METHOD.to_string(),
                models,
                resolution: Resolution {
                    width: raw.width(),
                    height: raw.height(),
                },
                processing: Processing {
                    omni_raw_count: raw.components.len(),
                    final_count: component_count,
                    merge_log,
                    path: Some(output.path),
                    alignment,
                    degraded: output.degraded,
                },
            },
            components: output.components,
            component_count,
        }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
