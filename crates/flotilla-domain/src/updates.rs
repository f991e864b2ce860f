use chrono::{DateTime, Utc};

use crate::types::{Definition, EnvList, PortsList, Run, RunStatus};

/// Partial update for a [`Definition`].
///
/// `Some` overwrites the existing field; `None` preserves it. `env` and
/// `ports`, when present, replace the entire list.
#[derive(Debug, Clone, Default)]
pub struct DefinitionUpdates {
    pub arn: Option<String>,
    pub image: Option<String>,
    pub group_name: Option<String>,
    pub container_name: Option<String>,
    pub user: Option<String>,
    pub alias: Option<String>,
    pub memory: Option<i64>,
    pub command: Option<String>,
    pub env: Option<EnvList>,
    pub ports: Option<PortsList>,
}

impl DefinitionUpdates {
    /// Merge into `existing`, overwriting only the fields that are set.
    pub fn apply_to(self, existing: &mut Definition) {
        if let Some(arn) = self.arn {
            existing.arn = arn;
        }
        if let Some(image) = self.image {
            existing.image = image;
        }
        if let Some(group_name) = self.group_name {
            existing.group_name = group_name;
        }
        if let Some(container_name) = self.container_name {
            existing.container_name = container_name;
        }
        if let Some(user) = self.user {
            existing.user = user;
        }
        if let Some(alias) = self.alias {
            existing.alias = alias;
        }
        if let Some(memory) = self.memory {
            existing.memory = memory;
        }
        if let Some(command) = self.command {
            existing.command = command;
        }
        if let Some(env) = self.env {
            existing.env = Some(env);
        }
        if let Some(ports) = self.ports {
            existing.ports = Some(ports);
        }
    }
}

/// Partial update for a [`Run`]. Same merge rule as [`DefinitionUpdates`].
///
/// `exit_code = None` keeps the existing value; an exit code cannot be
/// cleared once recorded.
#[derive(Debug, Clone, Default)]
pub struct RunUpdates {
    pub task_arn: Option<String>,
    pub cluster_name: Option<String>,
    pub status: Option<RunStatus>,
    pub exit_code: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub instance_id: Option<String>,
    pub instance_dns_name: Option<String>,
    pub group_name: Option<String>,
    pub env: Option<EnvList>,
}

impl RunUpdates {
    pub fn apply_to(self, existing: &mut Run) {
        if let Some(task_arn) = self.task_arn {
            existing.task_arn = task_arn;
        }
        if let Some(cluster_name) = self.cluster_name {
            existing.cluster_name = cluster_name;
        }
        if let Some(status) = self.status {
            existing.status = status;
        }
        if let Some(exit_code) = self.exit_code {
            existing.exit_code = Some(exit_code);
        }
        if let Some(started_at) = self.started_at {
            existing.started_at = Some(started_at);
        }
        if let Some(finished_at) = self.finished_at {
            existing.finished_at = Some(finished_at);
        }
        if let Some(instance_id) = self.instance_id {
            existing.instance_id = instance_id;
        }
        if let Some(instance_dns_name) = self.instance_dns_name {
            existing.instance_dns_name = instance_dns_name;
        }
        if let Some(group_name) = self.group_name {
            existing.group_name = group_name;
        }
        if let Some(env) = self.env {
            existing.env = Some(env);
        }
    }
}
