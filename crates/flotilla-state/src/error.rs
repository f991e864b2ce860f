use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("definition not found: {0}")]
    DefinitionNotFound(String),

    #[error("run not found: {0}")]
    RunNotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    Malformed(String),

    #[error(transparent)]
    Config(#[from] flotilla_config::ConfigError),

    #[error("database error: {0}")]
    Database(String),
}
