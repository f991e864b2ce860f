use std::sync::Arc;

use flotilla_config::Config;
use flotilla_domain::{
    new_run_id, Definition, EnvList, EnvVar, Run, RunStatus, RunUpdates,
};
use flotilla_queue::QueueManager;
use flotilla_state::{ListQuery, RunList, StateManager};
use tracing::{info, warn};

use crate::adapter::{ClusterClient, ExecutionEngine, RegistryClient};
use crate::error::ExecutionError;

pub const SERVER_MODE_VAR: &str = "FLOTILLA_SERVER_MODE";
pub const RUN_ID_VAR: &str = "FLOTILLA_RUN_ID";
pub const DEFAULT_OWNER_ID_VAR: &str = "FLOTILLA_RUN_OWNER_ID";

// Reserved environment variables are an ordered table of name → derivation
// over the run being created. Populated once at initialization, read-only
// afterwards.
enum ReservedSource {
    ServerMode(String),
    RunId,
    Owner,
}

struct ReservedVar {
    name: String,
    source: ReservedSource,
}

impl ReservedVar {
    fn value_for(&self, run: &Run) -> String {
        match &self.source {
            ReservedSource::ServerMode(mode) => mode.clone(),
            ReservedSource::RunId => run.run_id.clone(),
            ReservedSource::Owner => run.user.clone(),
        }
    }
}

/// Orchestration core: mediates between the state manager and the queue
/// manager to admit, queue, and terminate runs.
pub struct ExecutionService {
    state: Arc<dyn StateManager>,
    queue: Arc<dyn QueueManager>,
    cluster: Arc<dyn ClusterClient>,
    registry: Arc<dyn RegistryClient>,
    engine: Arc<dyn ExecutionEngine>,
    reserved_env: Vec<ReservedVar>,
}

impl ExecutionService {
    pub fn new(
        conf: &Config,
        state: Arc<dyn StateManager>,
        queue: Arc<dyn QueueManager>,
        cluster: Arc<dyn ClusterClient>,
        registry: Arc<dyn RegistryClient>,
        engine: Arc<dyn ExecutionEngine>,
    ) -> Self {
        let mode = conf.flotilla_mode.clone().unwrap_or_default();
        let owner_key = conf
            .owner_id_var
            .clone()
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| DEFAULT_OWNER_ID_VAR.to_string());

        let reserved_env = vec![
            ReservedVar {
                name: SERVER_MODE_VAR.to_string(),
                source: ReservedSource::ServerMode(mode),
            },
            ReservedVar {
                name: RUN_ID_VAR.to_string(),
                source: ReservedSource::RunId,
            },
            ReservedVar {
                name: owner_key,
                source: ReservedSource::Owner,
            },
        ];

        ExecutionService { state, queue, cluster, registry, engine, reserved_env }
    }

    /// Names of the reserved run environment variables.
    pub fn reserved_variables(&self) -> Vec<&str> {
        self.reserved_env.iter().map(|v| v.name.as_str()).collect()
    }

    fn is_reserved(&self, name: &str) -> bool {
        self.reserved_env.iter().any(|v| v.name == name)
    }

    /// Construct and queue a new run on the specified cluster.
    pub async fn create(
        &self,
        definition_id: &str,
        cluster_name: &str,
        env: Option<EnvList>,
        owner_id: &str,
    ) -> Result<Run, ExecutionError> {
        // Ensure the definition exists
        let definition = self.state.get_definition(definition_id).await?;

        // Validate that the definition can be run (no reserved env names,
        // image exists, cluster accepts it)
        self.check_runnable(cluster_name, &definition, env.as_ref())
            .await?;

        let run = self.construct_run(cluster_name, &definition, env, owner_id);

        // Persist to the source of state. This must commit -before- the
        // enqueue so no message ever refers to an unsaved run.
        self.state.create_run(&run).await?;
        info!(run_id = %run.run_id, definition_id, cluster_name, "run admitted");

        let qurl = self.queue.qurl_for(&run.cluster_name).await?;
        if let Err(e) = self.queue.enqueue(&qurl, &run).await {
            // The run stays in the store with status QUEUED; a reconciler
            // may re-enqueue it.
            warn!(run_id = %run.run_id, error = %e, "enqueue failed after persist");
            return Err(e.into());
        }
        Ok(run)
    }

    fn construct_run(
        &self,
        cluster_name: &str,
        definition: &Definition,
        env: Option<EnvList>,
        owner_id: &str,
    ) -> Run {
        let mut run = Run {
            run_id: new_run_id(),
            definition_id: definition.definition_id.clone(),
            cluster_name: cluster_name.to_string(),
            group_name: definition.group_name.clone(),
            status: RunStatus::Queued,
            user: owner_id.to_string(),
            ..Default::default()
        };
        run.env = Some(self.construct_environ(&run, env));
        run
    }

    /// Reserved variables (derived against this run) followed by the
    /// caller's env, in that order.
    fn construct_environ(&self, run: &Run, env: Option<EnvList>) -> EnvList {
        let mut run_env = EnvList::new();
        for reserved in &self.reserved_env {
            run_env.push(EnvVar::new(reserved.name.clone(), reserved.value_for(run)));
        }
        if let Some(env) = env {
            for var in &env {
                run_env.push(var.clone());
            }
        }
        run_env
    }

    async fn check_runnable(
        &self,
        cluster_name: &str,
        definition: &Definition,
        env: Option<&EnvList>,
    ) -> Result<(), ExecutionError> {
        if let Some(env) = env {
            for var in env {
                if self.is_reserved(&var.name) {
                    return Err(ExecutionError::Conflict(format!(
                        "environment variable {} is reserved",
                        var.name
                    )));
                }
            }
        }

        if !self.registry.is_image_valid(&definition.image).await? {
            return Err(ExecutionError::NotFound(format!(
                "image [{}] was not found in any of the configured repositories",
                definition.image
            )));
        }

        if !self.cluster.can_be_run(cluster_name, definition).await? {
            return Err(ExecutionError::Malformed(format!(
                "definition [{}] cannot be run on cluster [{}]",
                definition.definition_id, cluster_name
            )));
        }
        Ok(())
    }

    /// List runs, validating the `definition_id` and `status` filters.
    pub async fn list(&self, query: &ListQuery) -> Result<RunList, ExecutionError> {
        if let Some(definition_id) = query.filters.get("definition_id") {
            self.state.get_definition(definition_id).await?;
        }

        if let Some(status) = query.filters.get("status") {
            if RunStatus::parse(status).is_none() {
                return Err(ExecutionError::Malformed(format!(
                    "invalid status [{status}]"
                )));
            }
        }
        Ok(self.state.list_runs(query).await?)
    }

    /// Return the run with the given id.
    pub async fn get(&self, run_id: &str) -> Result<Run, ExecutionError> {
        Ok(self.state.get_run(run_id).await?)
    }

    /// Support for runs that report their own status transitions.
    pub async fn update_status(
        &self,
        run_id: &str,
        status: &str,
        exit_code: Option<i64>,
    ) -> Result<Run, ExecutionError> {
        let status = RunStatus::parse(status)
            .ok_or_else(|| ExecutionError::Malformed(format!("status {status} is invalid")))?;
        let updates = RunUpdates {
            status: Some(status),
            exit_code,
            ..Default::default()
        };
        Ok(self.state.update_run(run_id, updates).await?)
    }

    /// Stop the run with the given id via the execution engine.
    pub async fn terminate(&self, run_id: &str) -> Result<(), ExecutionError> {
        let run = self.state.get_run(run_id).await?;

        if run.status != RunStatus::Stopped
            && !run.task_arn.is_empty()
            && !run.cluster_name.is_empty()
        {
            return Ok(self.engine.terminate(&run).await?);
        }
        Err(ExecutionError::Malformed(format!(
            "invalid run, status: {}, task_arn: {}, cluster_name: {}",
            run.status, run.task_arn, run.cluster_name
        )))
    }
}
