use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Config(#[from] flotilla_config::ConfigError),

    #[error("{0}")]
    Malformed(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error reported by the queue service itself, with its error code.
    #[error("sqs error [{code}]: {message}")]
    Api { code: String, message: String },

    #[error("queue backend error: {0}")]
    Backend(String),
}
