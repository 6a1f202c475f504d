use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::align::anchors::{numeric_anchors, shares_anchor};
use crate::component::component_model::{Component, RawComponentSet};

// ============================================================================
// Configuration and report
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Non-zero shifts tried against the identity alignment, in tie-break order
    #[serde(default = "default_shifts")]
    pub shift_candidates: Vec<i32>,

    /// Smaller sets are too short to tell a shift from noise
    #[serde(default = "default_min_components")]
    pub min_components: usize,

    /// Backward window growth is capped at this many steps per unit of shift
    #[serde(default = "default_backward_steps")]
    pub backward_steps_per_shift: usize,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            shift_candidates: default_shifts(),
            min_components: default_min_components(),
            backward_steps_per_shift: default_backward_steps(),
        }
    }
}

fn default_shifts() -> Vec<i32> { vec![1, -1, 2, -2] }
fn default_min_components() -> usize { 3 }
fn default_backward_steps() -> usize { 2 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFix {
    pub index: usize,
    pub before: String,
    pub after: String,
}

/// What the validator decided and changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentReport {
    /// Applied shift; 0 when the text was left alone
    pub shift: i32,
    /// Inclusive range of final indices the correction covered
    pub window: Option<(usize, usize)>,
    pub fixes: Vec<TextFix>,
    /// Components whose text could not be recovered
    pub unverified: Vec<usize>,
}

impl AlignmentReport {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn is_noop(&self) -> bool {
        self.shift == 0 && self.fixes.is_empty() && self.unverified.is_empty()
    }
}

// ============================================================================
// AlignmentValidator
// ============================================================================

/// Detects and repairs planner text that drifted by a constant offset
/// against the components it was assigned to.
///
/// Numeric anchors (3+ digit runs) in each component's displayed text are
/// compared with the anchors in the OCR text of its raw sources. A shift is
/// only applied when it has net positive evidence and scores strictly
/// better than leaving things alone.
#[derive(Debug, Clone, Default)]
pub struct AlignmentValidator {
    pub config: AlignmentConfig,
}

struct AnchorTable {
    displayed: Vec<BTreeSet<String>>,
    ocr: Vec<BTreeSet<String>>,
}

impl AnchorTable {
    fn build(components: &[Component], ocr_texts: &[String]) -> Self {
        Self {
            displayed: components.iter().map(|c| numeric_anchors(&c.text)).collect(),
            ocr: ocr_texts.iter().map(|t| numeric_anchors(t)).collect(),
        }
    }

    fn len(&self) -> usize {
        self.displayed.len()
    }

    /// `Some(true)` when displayed text at `i` shares an anchor with the OCR
    /// text at `j`, `Some(false)` on a conflict, `None` without evidence.
    fn agrees(&self, i: usize, j: usize) -> Option<bool> {
        let (shown, ocr) = (&self.displayed[i], &self.ocr[j]);
        if shown.is_empty() || ocr.is_empty() {
            return None;
        }
        Some(shares_anchor(shown, ocr))
    }

    fn score(&self, shift: i32) -> i32 {
        let n = self.len() as i64;
        (0..n)
            .filter_map(|i| {
                let j = i + shift as i64;
                if j < 0 || j >= n {
                    return None;
                }
                self.agrees(i as usize, j as usize)
            })
            .map(|ok| if ok { 1 } else { -1 })
            .sum()
    }
}

impl AlignmentValidator {
    pub fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }

    /// Check `components` against `raw` and rotate drifted text in place.
    /// Components outside the affected window are never touched.
    pub fn validate(&self, components: &mut [Component], raw: &RawComponentSet) -> AlignmentReport {
        let n = components.len();
        if n < self.config.min_components {
            return AlignmentReport::unchanged();
        }

        let ocr_texts: Vec<String> = components
            .iter()
            .map(|c| raw.source_text(&c.provenance()))
            .collect();
        let table = AnchorTable::build(components, &ocr_texts);

        let shift = self.best_shift(&table);
        if shift == 0 {
            return AlignmentReport::unchanged();
        }

        let conflicts: Vec<usize> = (0..n).filter(|&i| table.agrees(i, i) == Some(false)).collect();
        let (Some(&first), Some(&last)) = (conflicts.first(), conflicts.last()) else {
            return AlignmentReport::unchanged();
        };

        // Grow backwards until a confirmed match or the step cap.
        let mut start = first;
        let max_steps = shift.unsigned_abs() as usize * self.config.backward_steps_per_shift;
        for k in 1..=max_steps {
            let Some(candidate) = first.checked_sub(k) else {
                break;
            };
            if table.agrees(candidate, candidate) == Some(true) {
                break;
            }
            start = candidate;
        }

        let report = rotate_window(components, &ocr_texts, start, last, shift);
        if !report.fixes.is_empty() {
            tracing::info!(
                shift,
                window_start = start,
                window_end = last,
                fixes = report.fixes.len(),
                "text alignment corrected"
            );
            for fix in &report.fixes {
                tracing::debug!(index = fix.index, before = %fix.before, after = %fix.after, "text fix");
            }
        }
        report
    }

    /// A shift must beat the identity alignment and score above zero.
    fn best_shift(&self, table: &AnchorTable) -> i32 {
        let mut best_shift = 0;
        let mut best_score = table.score(0).max(0);
        for &s in &self.config.shift_candidates {
            if s == 0 {
                continue;
            }
            let score = table.score(s);
            tracing::trace!(shift = s, score, "alignment shift score");
            if score > best_score {
                best_score = score;
                best_shift = s;
            }
        }
        best_shift
    }
}

/// Within `[start, end]`, position `p` takes the text that sat at `p - shift`.
/// Positions whose source falls outside the window recover their own OCR
/// text, or are flagged unverified when there is none.
fn rotate_window(
    components: &mut [Component],
    ocr_texts: &[String],
    start: usize,
    end: usize,
    shift: i32,
) -> AlignmentReport {
    let original: Vec<String> = components[start..=end].iter().map(|c| c.text.clone()).collect();
    let size = original.len() as i64;

    let mut report = AlignmentReport {
        shift,
        window: Some((start, end)),
        ..AlignmentReport::default()
    };

    for pos in 0..size {
        let idx = start + pos as usize;
        let source_pos = pos - shift as i64;

        let new_text = if (0..size).contains(&source_pos) {
            original[source_pos as usize].clone()
        } else {
            let recovered = ocr_texts[idx].clone();
            if recovered.trim().is_empty() {
                components[idx].text_unverified = true;
                report.unverified.push(idx);
                continue;
            }
            recovered
        };

        let comp = &mut components[idx];
        if comp.text != new_text {
            let before = std::mem::replace(&mut comp.text, new_text.clone());
            comp.text_before_fix = Some(before.clone());
            comp.text_fix = Some(format!("shift_{}", shift));
            report.fixes.push(TextFix {
                index: idx,
                before,
                after: new_text,
            });
        }
    }

    report
}
