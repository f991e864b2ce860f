use async_trait::async_trait;
use flotilla_domain::{Definition, Run};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("registry error: {0}")]
    Registry(String),

    #[error("cluster error: {0}")]
    Cluster(String),

    #[error("engine error: {0}")]
    Engine(String),
}

/// Image-registry probe consulted at admission time.
#[async_trait]
pub trait RegistryClient: Send + Sync + 'static {
    async fn is_image_valid(&self, image: &str) -> Result<bool, AdapterError>;
}

/// Cluster-capability probe consulted at admission time.
#[async_trait]
pub trait ClusterClient: Send + Sync + 'static {
    async fn can_be_run(
        &self,
        cluster_name: &str,
        definition: &Definition,
    ) -> Result<bool, AdapterError>;
}

/// Cluster back-end that can stop an in-flight run.
///
/// Implementations own idempotency and publish the resulting status
/// transition back into the state store.
#[async_trait]
pub trait ExecutionEngine: Send + Sync + 'static {
    async fn terminate(&self, run: &Run) -> Result<(), AdapterError>;
}
