use thiserror::Error;

use crate::adapter::AdapterError;
use flotilla_queue::QueueError;
use flotilla_state::StateError;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("{0}")]
    Malformed(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    State(StateError),

    #[error(transparent)]
    Queue(QueueError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

// Reclassify store and queue failures so callers see one taxonomy
// regardless of which layer produced the error.

impl From<StateError> for ExecutionError {
    fn from(e: StateError) -> Self {
        match e {
            StateError::DefinitionNotFound(_) | StateError::RunNotFound(_) => {
                ExecutionError::NotFound(e.to_string())
            }
            StateError::Conflict(_) => ExecutionError::Conflict(e.to_string()),
            StateError::Malformed(_) => ExecutionError::Malformed(e.to_string()),
            other => ExecutionError::State(other),
        }
    }
}

impl From<QueueError> for ExecutionError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::Malformed(_) => ExecutionError::Malformed(e.to_string()),
            other => ExecutionError::Queue(other),
        }
    }
}
