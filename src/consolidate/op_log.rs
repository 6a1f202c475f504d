use serde::{Deserialize, Serialize};

/// What happened to a group of raw indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    Merge,
    Delete,
    Keep,
    /// Index no operation mentioned; passed through unchanged
    ImplicitKeep,
    /// Index already consumed by an earlier operation
    IgnoredDuplicate,
    /// Index not present in the raw set
    Unresolved,
    /// Merge whose indices all failed to resolve
    SkippedMerge,
    /// Operation with an action this engine does not know
    UnknownAction,
}

impl LogAction {
    /// Whether this entry accounts for raw indices in the final partition.
    pub fn consumes(&self) -> bool {
        matches!(
            self,
            LogAction::Merge | LogAction::Delete | LogAction::Keep | LogAction::ImplicitKeep
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpLogEntry {
    pub action: LogAction,
    pub indices: Vec<usize>,
    /// Final (post-sort) index of the component this entry produced
    pub result_index: Option<usize>,
    pub reason: String,
}

/// Audit trail of one consolidation run. Diagnostics only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationLog {
    pub entries: Vec<OpLogEntry>,
}

impl OperationLog {
    pub fn push(
        &mut self,
        action: LogAction,
        indices: Vec<usize>,
        result_index: Option<usize>,
        reason: impl ToString,
    ) {
        self.entries.push(OpLogEntry {
            action,
            indices,
            result_index,
            reason: reason.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OpLogEntry> {
        self.entries.iter()
    }

    /// All indices logged under `action`, in log order.
    pub fn indices_for(&self, action: LogAction) -> Vec<usize> {
        self.entries
            .iter()
            .filter(|e| e.action == action)
            .flat_map(|e| e.indices.iter().copied())
            .collect()
    }

    /// Rewrite `result_index` through `remap[provisional] = final`.
    pub(crate) fn remap_results(&mut self, remap: &[usize]) {
        for entry in &mut self.entries {
            if let Some(r) = entry.result_index {
                entry.result_index = remap.get(r).copied();
            }
        }
    }
}
