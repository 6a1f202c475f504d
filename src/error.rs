use thiserror::Error;

/// Errors raised at the edges of the fusion pipeline: file I/O, config,
/// and the planner boundary. The consolidation core never returns these.
#[derive(Debug, Error)]
pub enum FusionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Planner endpoint answered with a non-success status
    #[error("planner returned {status}: {body}")]
    PlannerStatus { status: u16, body: String },

    /// Reasoner reply did not contain a parseable JSON object
    #[error("no JSON object in planner reply: {0}")]
    NoJson(String),

    #[error("planner error: {0}")]
    Planner(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type FusionResult<T> = Result<T, FusionError>;
