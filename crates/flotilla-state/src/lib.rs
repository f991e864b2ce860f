pub mod error;
pub mod manager;
pub mod memory;
pub mod postgres;

pub use error::StateError;
pub use manager::{DefinitionList, ListQuery, RunList, StateManager};
pub use memory::InMemoryStateManager;
pub use postgres::PostgresStateManager;
