use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Geometry
// ============================================================================

/// Axis-aligned pixel rectangle, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Saturates at the `i32` range for out-of-range detector boxes.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Smallest rectangle enclosing every box in `boxes`, computed in `i64`
    /// and clamped back to `i32`. Returns `None` when the iterator is empty.
    pub fn union<'a>(boxes: impl IntoIterator<Item = &'a Bounds>) -> Option<Bounds> {
        let mut iter = boxes.into_iter();
        let first = iter.next()?;
        let edges = |b: &Bounds| {
            let (x, y) = (i64::from(b.x), i64::from(b.y));
            (x, y, x + i64::from(b.width), y + i64::from(b.height))
        };

        let (mut min_x, mut min_y, mut max_x, mut max_y) = edges(first);
        for b in iter {
            let (x, y, r, btm) = edges(b);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(r);
            max_y = max_y.max(btm);
        }

        Some(Bounds {
            x: clamp_i32(min_x),
            y: clamp_i32(min_y),
            width: clamp_i32(max_x - min_x),
            height: clamp_i32(max_y - min_y),
        })
    }
}

fn clamp_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

// ============================================================================
// Components
// ============================================================================

/// Where a component's bounds came from when they could not be taken
/// verbatim from the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsSource {
    /// Recomputed as the union of the referenced raw detections
    SourceIndices,
    /// Copied from a raw detection with matching text
    MatchedFromRaw,
    /// Rescaled from the planner's reference image width
    ScaledFromReference,
    /// Planner coordinates kept as-is, nothing could confirm them
    Unverified,
}

/// One UI component. The same shape carries raw detections, planner-authored
/// legacy components, and final consolidated components; provenance fields
/// are only serialized when set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(default)]
    pub index: usize,

    #[serde(rename = "class", default = "default_class")]
    pub class: String,

    #[serde(default)]
    pub bounds: Bounds,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub clickable: bool,

    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub confidence: f32,

    #[serde(rename = "contentDesc", default, skip_serializing_if = "Option::is_none")]
    pub content_desc: Option<String>,

    /// Raw indices this component was built from (empty for pass-through originals)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_indices: Vec<usize>,

    /// Raw index of a kept, unmerged component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_index: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(rename = "_text_unverified", default, skip_serializing_if = "is_false")]
    pub text_unverified: bool,

    #[serde(rename = "_text_before_fix", default, skip_serializing_if = "Option::is_none")]
    pub text_before_fix: Option<String>,

    #[serde(rename = "_text_fix", default, skip_serializing_if = "Option::is_none")]
    pub text_fix: Option<String>,

    #[serde(rename = "_bounds_source", default, skip_serializing_if = "Option::is_none")]
    pub bounds_source: Option<BoundsSource>,
}

pub const DEFAULT_CLASS: &str = "Card";

fn default_class() -> String {
    DEFAULT_CLASS.to_string()
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl Component {
    /// Bare component with detector-level fields only.
    pub fn new(index: usize, class: &str, bounds: Bounds, text: &str) -> Self {
        Self {
            index,
            class: class.to_string(),
            bounds,
            text: text.to_string(),
            clickable: false,
            source: String::new(),
            confidence: 0.0,
            content_desc: None,
            source_indices: Vec::new(),
            original_index: None,
            note: None,
            text_unverified: false,
            text_before_fix: None,
            text_fix: None,
            bounds_source: None,
        }
    }

    pub fn clickable(mut self, clickable: bool) -> Self {
        self.clickable = clickable;
        self
    }

    /// Raw indices whose OCR text backs this component: its merge sources,
    /// or its own original index when it was kept unmerged.
    pub fn provenance(&self) -> Vec<usize> {
        if !self.source_indices.is_empty() {
            self.source_indices.clone()
        } else {
            self.original_index.into_iter().collect()
        }
    }
}

// ============================================================================
// Raw detector output
// ============================================================================

/// Detector output for one screenshot. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawComponentSet {
    /// `[width, height]` in pixels
    pub image_size: [u32; 2],
    #[serde(default)]
    pub components: Vec<Component>,
}

impl RawComponentSet {
    pub fn new(width: u32, height: u32, components: Vec<Component>) -> Self {
        Self {
            image_size: [width, height],
            components,
        }
    }

    pub fn width(&self) -> u32 {
        self.image_size[0]
    }

    pub fn height(&self) -> u32 {
        self.image_size[1]
    }

    /// Index -> component lookup. The first component carrying an index wins.
    pub fn by_index(&self) -> HashMap<usize, &Component> {
        let mut map = HashMap::with_capacity(self.components.len());
        for c in &self.components {
            map.entry(c.index).or_insert(c);
        }
        map
    }

    /// Space-joined non-empty OCR text of the given raw indices, in order.
    pub fn source_text(&self, indices: &[usize]) -> String {
        let lookup = self.by_index();
        indices
            .iter()
            .filter_map(|i| lookup.get(i))
            .map(|c| c.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
