use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid definition id: {0}")]
    InvalidDefinitionId(String),
}
