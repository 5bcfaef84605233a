use std::io;

/// Custom error type for simple_ci_runner operations
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Stage '{stage}' failed:\n{message}")]
    StageFailed { stage: String, message: String },

    #[error("Stage '{stage}' failed to start: {source}")]
    SpawnFailed { stage: String, source: io::Error },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Another run of this pipeline is already active (lock file: {0})")]
    LockHeld(String),

    #[error("Cleanup command failed: {0}")]
    CleanupFailed(String),

    #[error("Webhook notification failed: {0}")]
    NotifyFailed(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),
}

/// Helper type for Results that use RunnerError
pub type Result<T> = std::result::Result<T, RunnerError>;
