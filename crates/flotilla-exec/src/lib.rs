pub mod adapter;
pub mod error;
pub mod local;
pub mod service;

pub use adapter::{AdapterError, ClusterClient, ExecutionEngine, RegistryClient};
pub use error::ExecutionError;
pub use local::{LocalClusterClient, LocalExecutionEngine, LocalRegistryClient};
pub use service::{ExecutionService, DEFAULT_OWNER_ID_VAR, RUN_ID_VAR, SERVER_MODE_VAR};
