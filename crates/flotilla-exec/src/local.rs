use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use flotilla_domain::{Definition, Run, RunStatus, RunUpdates};
use flotilla_state::StateManager;
use tracing::debug;

use crate::adapter::{AdapterError, ClusterClient, ExecutionEngine, RegistryClient};

/// Registry client that accepts any non-empty image reference.
/// Performs no actual I/O; for local development and tests.
#[derive(Debug, Default, Clone)]
pub struct LocalRegistryClient;

impl LocalRegistryClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RegistryClient for LocalRegistryClient {
    async fn is_image_valid(&self, image: &str) -> Result<bool, AdapterError> {
        Ok(!image.is_empty())
    }
}

/// Cluster client that accepts every definition on every cluster.
#[derive(Debug, Default, Clone)]
pub struct LocalClusterClient;

impl LocalClusterClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ClusterClient for LocalClusterClient {
    async fn can_be_run(
        &self,
        _cluster_name: &str,
        _definition: &Definition,
    ) -> Result<bool, AdapterError> {
        Ok(true)
    }
}

/// Execution engine that simulates termination by writing the terminal
/// status straight back into the state store.
pub struct LocalExecutionEngine {
    state: Arc<dyn StateManager>,
}

impl LocalExecutionEngine {
    pub fn new(state: Arc<dyn StateManager>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ExecutionEngine for LocalExecutionEngine {
    async fn terminate(&self, run: &Run) -> Result<(), AdapterError> {
        debug!(run_id = %run.run_id, "LocalExecutionEngine: terminate");
        self.state
            .update_run(
                &run.run_id,
                RunUpdates {
                    status: Some(RunStatus::Stopped),
                    finished_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| AdapterError::Engine(e.to_string()))?;
        Ok(())
    }
}
