use thiserror::Error;

#[derive(Debug, Error)]
pub enum MaestroError {
    #[error("not initialized: run 'maestro init'")]
    NotInitialized,

    #[error("agent catalog directory not found at {0}: run 'maestro init'")]
    CatalogMissing(String),

    #[error("agent not found: {0}")]
    AgentNotFound(String),

    #[error("invalid agent file '{file}': {reason}")]
    InvalidAgentFile { file: String, reason: String },

    #[error("invalid agent id '{0}': must be lowercase alphanumeric with underscores")]
    InvalidAgentId(String),

    #[error("invalid task type: {0}")]
    InvalidTaskType(String),

    #[error("invalid project type: {0}")]
    InvalidProjectType(String),

    #[error("malformed metrics file at {path}: {reason}")]
    MalformedMetrics { path: String, reason: String },

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error("pipeline failed in phase '{phase}': {detail}")]
    PipelineFailed { phase: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MaestroError>;
