//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is absent or blank.
    #[error("{0} environment variable is required")]
    MissingVar(String),

    /// A numeric variable could not be parsed.
    #[error("{key} must be a valid port number, got '{value}'")]
    InvalidPort { key: String, value: String },

    /// The `.env` file exists but could not be read.
    #[error("failed to load .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),
}
