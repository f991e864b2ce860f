use std::collections::HashMap;

use async_trait::async_trait;
use flotilla_domain::{Definition, DefinitionUpdates, Run, RunUpdates};
use serde::Serialize;

use crate::error::StateError;

/// Parameters for a filtered, sorted, paginated list.
///
/// `sort_by` and `order` are always validated against the entity's
/// whitelist; there are no defaults. `filters` map column names to scalar
/// values (AND-combined), `env_filters` map env-var names to values that
/// the entity's env list must contain exactly.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub limit: usize,
    pub offset: usize,
    pub sort_by: String,
    pub order: String,
    pub filters: HashMap<String, String>,
    pub env_filters: HashMap<String, String>,
}

impl ListQuery {
    pub fn new(
        limit: usize,
        offset: usize,
        sort_by: impl Into<String>,
        order: impl Into<String>,
    ) -> Self {
        ListQuery {
            limit,
            offset,
            sort_by: sort_by.into(),
            order: order.into(),
            filters: HashMap::new(),
            env_filters: HashMap::new(),
        }
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn with_env_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_filters.insert(name.into(), value.into());
        self
    }
}

/// One page of definitions plus the total count matching the filters.
#[derive(Debug, Clone, Serialize)]
pub struct DefinitionList {
    pub definitions: Vec<Definition>,
    pub total: i64,
}

/// One page of runs plus the total count matching the filters.
#[derive(Debug, Clone, Serialize)]
pub struct RunList {
    pub runs: Vec<Run>,
    pub total: i64,
}

/// Source-of-truth store for definitions and runs.
#[async_trait]
pub trait StateManager: Send + Sync + 'static {
    /// Name of the state manager, matching the value in configuration.
    fn name(&self) -> &'static str;

    async fn create_definition(&self, definition: &Definition) -> Result<(), StateError>;
    async fn get_definition(&self, definition_id: &str) -> Result<Definition, StateError>;
    async fn update_definition(
        &self,
        definition_id: &str,
        updates: DefinitionUpdates,
    ) -> Result<Definition, StateError>;
    async fn delete_definition(&self, definition_id: &str) -> Result<(), StateError>;
    async fn list_definitions(&self, query: &ListQuery) -> Result<DefinitionList, StateError>;

    async fn create_run(&self, run: &Run) -> Result<(), StateError>;
    async fn get_run(&self, run_id: &str) -> Result<Run, StateError>;
    async fn update_run(&self, run_id: &str, updates: RunUpdates) -> Result<Run, StateError>;
    async fn list_runs(&self, query: &ListQuery) -> Result<RunList, StateError>;
}

// ── Orderable / filterable column tables ──────────────────────────────────────
//
// Column names cannot be bound as SQL parameters, so both sort fields and
// filter keys are checked against these static tables before any SQL is
// assembled. Substring (LIKE) matching applies to `like_fields` only.

pub(crate) struct EntityFields {
    pub table: &'static str,
    pub key_column: &'static str,
    pub env_table: &'static str,
    pub env_fk: &'static str,
    pub order_fields: &'static [&'static str],
    pub filter_fields: &'static [&'static str],
    pub like_fields: &'static [&'static str],
}

pub(crate) const DEFINITION_FIELDS: EntityFields = EntityFields {
    table: "task_def",
    key_column: "definition_id",
    env_table: "task_def_environments",
    env_fk: "task_def_id",
    order_fields: &["alias", "image", "group_name", "memory"],
    filter_fields: &[
        "definition_id",
        "arn",
        "image",
        "group_name",
        "container_name",
        "user",
        "alias",
        "memory",
        "command",
    ],
    like_fields: &["image", "alias"],
};

pub(crate) const RUN_FIELDS: EntityFields = EntityFields {
    table: "task",
    key_column: "run_id",
    env_table: "task_environments",
    env_fk: "task_id",
    order_fields: &[
        "run_id",
        "cluster_name",
        "status",
        "started_at",
        "finished_at",
        "group_name",
    ],
    filter_fields: &[
        "run_id",
        "definition_id",
        "cluster_name",
        "status",
        "task_arn",
        "exit_code",
        "instance_id",
        "instance_dns_name",
        "group_name",
        "user",
    ],
    like_fields: &[],
};

pub(crate) fn validate_query(query: &ListQuery, entity: &EntityFields) -> Result<(), StateError> {
    if query.order != "asc" && query.order != "desc" {
        return Err(StateError::Malformed(format!(
            "invalid sort order [{}], must be one of ('asc', 'desc')",
            query.order
        )));
    }
    if !entity.order_fields.contains(&query.sort_by.as_str()) {
        return Err(StateError::Malformed(format!(
            "invalid field to order by [{}], must be one of [{}]",
            query.sort_by,
            entity.order_fields.join(", ")
        )));
    }
    for key in query.filters.keys() {
        if !entity.filter_fields.contains(&key.as_str()) {
            return Err(StateError::Malformed(format!(
                "invalid filter field [{}], must be one of [{}]",
                key,
                entity.filter_fields.join(", ")
            )));
        }
    }
    Ok(())
}
