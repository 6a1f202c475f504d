use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    align::validator::TextFix,
    pipeline::fusion::{FusionOutput, FusionPath},
};

#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub source: String,

    pub path: Option<FusionPath>,

    pub raw_count: usize,
    pub final_count: usize,
    pub log_entries: usize,

    pub shift: Option<i32>,
    pub window: Option<(usize, usize)>,
    pub fixes: Vec<TextFix>,
    pub unverified: Vec<usize>,

    pub degraded: Option<String>,
}

impl TraceEvent {
    pub fn now(source: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            source: source.to_string(),
            path: None,
            raw_count: 0,
            final_count: 0,
            log_entries: 0,
            shift: None,
            window: None,
            fixes: vec![],
            unverified: vec![],
            degraded: None,
        }
    }

    /// Capture counts, alignment corrections and degradation from a run.
    pub fn with_output(mut self, raw_count: usize, output: &FusionOutput) -> Self {
        self.path = Some(output.path);
        self.raw_count = raw_count;
        self.final_count = output.components.len();
        self.log_entries = output.log.len() + output.planner_log.len();
        if output.alignment.shift != 0 {
            self.shift = Some(output.alignment.shift);
        }
        self.window = output.alignment.window;
        self.fixes = output.alignment.fixes.clone();
        self.unverified = output.alignment.unverified.clone();
        self.degraded = output.degraded.clone();
        self
    }
}
