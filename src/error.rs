use thiserror::Error;

/// Main error type for the agent runtime
#[derive(Error, Debug)]
pub enum SparkError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Agent registry errors
    #[error("Agent discovery failed: {agent} - {reason}")]
    Discovery { agent: String, reason: String },

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Agent {agent} does not provide capability: {capability}")]
    MissingCapability { agent: String, capability: String },

    // Storage errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for SparkError
pub type Result<T> = std::result::Result<T, SparkError>;
