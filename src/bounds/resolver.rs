use serde::{Deserialize, Serialize};

use crate::component::component_model::{Bounds, BoundsSource, Component, RawComponentSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsConfig {
    /// Image width the planner is assumed to reason over when its
    /// coordinates come back uniformly scaled
    #[serde(default = "default_reference_width")]
    pub reference_width: u32,

    /// Fractional slack allowed past the image edge
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            reference_width: default_reference_width(),
            tolerance: default_tolerance(),
        }
    }
}

fn default_reference_width() -> u32 { 768 }
fn default_tolerance() -> f64 { 0.1 }

// ============================================================================
// BoundsResolver: legacy planner replies with their own coordinates
// ============================================================================

/// Re-derives trustworthy bounds for planner-authored components.
///
/// Planner coordinates are never taken on faith: source indices win, then
/// in-range coordinates pass, then text matching against raw detections,
/// then reference-width rescaling. Anything left is flagged unverified.
pub struct BoundsResolver<'a> {
    raw: &'a RawComponentSet,
    config: BoundsConfig,
}

impl<'a> BoundsResolver<'a> {
    pub fn new(raw: &'a RawComponentSet, config: BoundsConfig) -> Self {
        Self { raw, config }
    }

    pub fn resolve(&self, planner_components: Vec<Component>) -> Vec<Component> {
        planner_components
            .into_iter()
            .map(|c| self.resolve_one(c))
            .collect()
    }

    pub fn resolve_one(&self, mut comp: Component) -> Component {
        if !comp.source_indices.is_empty() {
            let lookup = self.raw.by_index();
            let union = Bounds::union(
                comp.source_indices
                    .iter()
                    .filter_map(|i| lookup.get(i))
                    .map(|c| &c.bounds),
            );
            if let Some(bounds) = union {
                comp.bounds = bounds;
                comp.bounds_source = Some(BoundsSource::SourceIndices);
                return comp;
            }
        }

        if self.within_image(&comp.bounds) {
            return comp;
        }

        if let Some(matched) = self.match_by_text(&comp.text) {
            tracing::debug!(text = %comp.text, "bounds recovered by text match");
            comp.bounds = matched;
            comp.bounds_source = Some(BoundsSource::MatchedFromRaw);
            return comp;
        }

        if let Some(scaled) = self.rescale(&comp.bounds) {
            tracing::debug!(text = %comp.text, "bounds rescaled from reference width");
            comp.bounds = scaled;
            comp.bounds_source = Some(BoundsSource::ScaledFromReference);
            return comp;
        }

        tracing::warn!(text = %comp.text, bounds = ?comp.bounds, "unverified planner bounds");
        comp.bounds_source = Some(BoundsSource::Unverified);
        comp
    }

    /// Whether `b` fits the image, allowing `tolerance` overshoot.
    pub fn within_image(&self, b: &Bounds) -> bool {
        let w = self.raw.width() as f64;
        let h = self.raw.height() as f64;
        let slack = 1.0 + self.config.tolerance;

        let right = b.x as f64 + b.width as f64;
        let bottom = b.y as f64 + b.height as f64;
        let invalid = right > w * slack
            || bottom > h * slack
            || b.width as f64 > w
            || b.height as f64 > h;
        !invalid
    }

    /// Exact text match first, then containment either way.
    fn match_by_text(&self, text: &str) -> Option<Bounds> {
        if text.is_empty() {
            return None;
        }
        let raw = &self.raw.components;

        raw.iter()
            .find(|c| c.text == text)
            .or_else(|| {
                raw.iter().find(|c| {
                    !c.text.is_empty() && (text.contains(c.text.as_str()) || c.text.contains(text))
                })
            })
            .map(|c| c.bounds)
    }

    /// Assume the planner saw a copy scaled to `reference_width` and map back.
    fn rescale(&self, b: &Bounds) -> Option<Bounds> {
        let reference = self.config.reference_width as f64;
        if reference <= 0.0 || b.width <= 0 {
            return None;
        }
        if b.x as f64 + b.width as f64 > reference * (1.0 + self.config.tolerance) {
            return None;
        }

        let scale = self.raw.width() as f64 / reference;
        let scaled = |v: i32| (v as f64 * scale) as i32;
        Some(Bounds::new(
            scaled(b.x),
            scaled(b.y),
            scaled(b.width),
            scaled(b.height),
        ))
    }
}
