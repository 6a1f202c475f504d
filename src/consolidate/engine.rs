use std::collections::{HashMap, HashSet};

use crate::component::component_model::{Bounds, Component, DEFAULT_CLASS, RawComponentSet};
use crate::component::geometry::canonical_order;
use crate::consolidate::op_log::{LogAction, OperationLog};
use crate::plan::plan_model::Operation;

pub const IMPLICIT_KEEP_NOTE: &str = "unprocessed, defaulted to keep";
pub const MERGED_SOURCE: &str = "merged";

/// Consolidated components in reading order plus the audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidationOutput {
    pub components: Vec<Component>,
    pub log: OperationLog,
}

// ============================================================================
// apply_operations: index-based edits to geometry
// ============================================================================

/// Apply planner operations to the raw detections.
///
/// Every raw index ends up in exactly one of: a merge, a delete, a keep, or
/// the implicit-keep pass. The first operation to mention an index wins;
/// later mentions are logged and ignored. Indices that name no raw
/// component are logged and skipped. The output is sorted by `(y, x)` and
/// reindexed from 0.
pub fn apply_operations(operations: &[Operation], raw: &RawComponentSet) -> ConsolidationOutput {
    let lookup = raw.by_index();
    let mut consumed: HashSet<usize> = HashSet::new();
    let mut components: Vec<Component> = Vec::new();
    let mut log = OperationLog::default();

    for op in operations {
        match op {
            Operation::Merge {
                indices,
                target_class,
                target_text,
                reason,
            } => {
                let claimed = claim(indices, &lookup, &consumed, &mut log);
                if claimed.is_empty() {
                    tracing::warn!(?indices, "merge resolved to no components, skipping");
                    log.push(LogAction::SkippedMerge, indices.clone(), None, reason);
                    continue;
                }

                let sources: Vec<&Component> = claimed.iter().map(|i| lookup[i]).collect();
                let merged = merge_components(
                    &sources,
                    &claimed,
                    target_class.as_deref(),
                    target_text.as_deref(),
                    reason,
                );
                tracing::debug!(from = ?claimed, class = %merged.class, "merge");

                consumed.extend(claimed.iter().copied());
                log.push(LogAction::Merge, claimed, Some(components.len()), reason);
                components.push(merged);
            }

            Operation::Delete { indices, reason } => {
                let claimed = claim(indices, &lookup, &consumed, &mut log);
                tracing::debug!(indices = ?claimed, reason = %reason, "delete");
                if !claimed.is_empty() {
                    consumed.extend(claimed.iter().copied());
                    log.push(LogAction::Delete, claimed, None, reason);
                }
            }

            Operation::Keep { indices, reason } => {
                for idx in claim(indices, &lookup, &consumed, &mut log) {
                    let mut kept = lookup[&idx].clone();
                    kept.original_index = Some(idx);
                    consumed.insert(idx);
                    log.push(LogAction::Keep, vec![idx], Some(components.len()), reason);
                    components.push(kept);
                }
            }

            Operation::Unknown => {
                tracing::warn!("ignoring operation with unknown action");
                log.push(LogAction::UnknownAction, Vec::new(), None, "unknown action ignored");
            }
        }
    }

    // Fail open: anything the planner forgot is kept.
    let mut seen: HashSet<usize> = HashSet::new();
    for comp in &raw.components {
        if !seen.insert(comp.index) {
            tracing::warn!(index = comp.index, "detector repeated an index, dropping the later component");
            log.push(
                LogAction::IgnoredDuplicate,
                vec![comp.index],
                None,
                "repeated raw index",
            );
            continue;
        }
        if !consumed.insert(comp.index) {
            continue;
        }
        let mut kept = comp.clone();
        kept.original_index = Some(comp.index);
        kept.note = Some(IMPLICIT_KEEP_NOTE.to_string());
        log.push(
            LogAction::ImplicitKeep,
            vec![comp.index],
            Some(components.len()),
            IMPLICIT_KEEP_NOTE,
        );
        components.push(kept);
    }

    let order = canonical_order(&mut components);
    let mut remap = vec![0; order.len()];
    for (new_pos, old_pos) in order.iter().enumerate() {
        remap[*old_pos] = new_pos;
    }
    log.remap_results(&remap);

    tracing::info!(
        raw = raw.components.len(),
        operations = operations.len(),
        result = components.len(),
        "consolidation complete"
    );

    ConsolidationOutput { components, log }
}

/// Resolve an operation's indices against the raw set, in order and without
/// repeats. Unknown and already-consumed indices are logged and dropped.
fn claim(
    indices: &[usize],
    lookup: &HashMap<usize, &Component>,
    consumed: &HashSet<usize>,
    log: &mut OperationLog,
) -> Vec<usize> {
    let mut claimed = Vec::with_capacity(indices.len());
    let mut unresolved = Vec::new();
    let mut duplicates = Vec::new();

    for &idx in indices {
        if !lookup.contains_key(&idx) {
            unresolved.push(idx);
        } else if consumed.contains(&idx) || claimed.contains(&idx) {
            duplicates.push(idx);
        } else {
            claimed.push(idx);
        }
    }

    if !unresolved.is_empty() {
        tracing::warn!(indices = ?unresolved, "operation references unknown indices");
        log.push(LogAction::Unresolved, unresolved, None, "index not in raw set");
    }
    if !duplicates.is_empty() {
        tracing::debug!(indices = ?duplicates, "indices already consumed");
        log.push(LogAction::IgnoredDuplicate, duplicates, None, "already consumed");
    }

    claimed
}

/// Build one component from several raw detections. Geometry is the exact
/// enclosing rectangle; planner text and class override the defaults.
pub fn merge_components(
    sources: &[&Component],
    source_indices: &[usize],
    target_class: Option<&str>,
    target_text: Option<&str>,
    reason: &str,
) -> Component {
    let bounds = Bounds::union(sources.iter().map(|c| &c.bounds)).unwrap_or_default();

    let text = match target_text {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => sources
            .iter()
            .map(|c| c.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    };

    let class = target_class
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CLASS);

    let confidence = sources
        .iter()
        .map(|c| c.confidence)
        .fold(0.0_f32, f32::max);

    let mut merged = Component::new(0, class, bounds, &text);
    merged.clickable = sources.iter().any(|c| c.clickable);
    merged.source = MERGED_SOURCE.to_string();
    merged.confidence = confidence;
    merged.source_indices = source_indices.to_vec();
    if !reason.is_empty() {
        merged.note = Some(reason.to_string());
    }
    merged
}
