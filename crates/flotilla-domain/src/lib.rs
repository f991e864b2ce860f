pub mod error;
pub mod types;
pub mod updates;
mod tests;

pub use error::DomainError;
pub use types::{
    new_run_id, Definition, EnvList, EnvVar, PortsList, Run, RunStatus,
};
pub use updates::{DefinitionUpdates, RunUpdates};
