use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::align::validator::AlignmentConfig;
use crate::bounds::resolver::BoundsConfig;
use crate::error::{FusionError, FusionResult};
use crate::pipeline::fusion::FusionConfig;
use crate::plan::retry::RetryPolicy;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "screen-fusion",
    version,
    about = "Consolidate detector output into semantic UI components"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: screen-fusion.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Append a JSONL audit event per run to this file
    #[arg(long, global = true)]
    pub trace: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Consolidate raw detections using a saved planner reply
    Apply {
        /// Raw detector output (JSON)
        #[arg(long)]
        raw: String,

        /// Planner reply (JSON or free text containing JSON); omit for raw fallback
        #[arg(long)]
        plan: Option<String>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Source name recorded in metadata (default: raw file name)
        #[arg(long)]
        source: Option<String>,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Ask the vision-language planner for edits, then consolidate
    Fuse {
        /// Screenshot the detections came from
        #[arg(long)]
        image: String,

        /// Raw detector output (JSON)
        #[arg(long)]
        raw: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Planner endpoint (chat completions URL)
        #[arg(long)]
        endpoint: Option<String>,

        /// Planner model name
        #[arg(long)]
        model: Option<String>,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Re-run only the text alignment check over a final component document
    Align {
        /// Final UI-JSON document
        #[arg(long = "final")]
        final_doc: String,

        /// Raw detector output the document was built from
        #[arg(long)]
        raw: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `screen-fusion.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub alignment: AlignmentConfig,
    #[serde(default)]
    pub bounds: BoundsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

// Serde default helpers
fn default_endpoint() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_model() -> String { "gpt-4o".to_string() }
fn default_api_key_env() -> String { "SCREEN_FUSION_API_KEY".to_string() }
fn default_timeout_secs() -> u64 { 180 }
fn default_max_attempts() -> u32 { 5 }
fn default_base_delay_ms() -> u64 { 5_000 }
fn default_max_delay_ms() -> u64 { 60_000 }

impl PlannerConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

impl AppConfig {
    pub fn fusion_config(&self) -> FusionConfig {
        FusionConfig {
            alignment: self.alignment.clone(),
            bounds: self.bounds.clone(),
        }
    }

    /// Reject values the deterministic stages cannot work with.
    pub fn validate(&self) -> FusionResult<()> {
        if self.bounds.reference_width == 0 {
            return Err(FusionError::Config("bounds.reference_width must be positive".into()));
        }
        if self.bounds.tolerance.is_nan() || self.bounds.tolerance < 0.0 {
            return Err(FusionError::Config("bounds.tolerance must be non-negative".into()));
        }
        if self.alignment.shift_candidates.iter().any(|&s| s == 0) {
            return Err(FusionError::Config("alignment.shift_candidates must not contain 0".into()));
        }
        if self.planner.endpoint.trim().is_empty() {
            return Err(FusionError::Config("planner.endpoint is empty".into()));
        }
        Ok(())
    }
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("screen-fusion.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %config_path, error = %e, "malformed config, using defaults");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

pub fn parse_config(content: &str) -> FusionResult<AppConfig> {
    let config: AppConfig = serde_yaml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// `RUST_LOG`-style filter directive for a `-v` count.
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
