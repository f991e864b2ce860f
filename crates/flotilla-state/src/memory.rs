use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use flotilla_domain::{Definition, DefinitionUpdates, EnvList, Run, RunUpdates};
use tokio::sync::RwLock;

use crate::error::StateError;
use crate::manager::{
    validate_query, DefinitionList, EntityFields, ListQuery, RunList, StateManager,
    DEFINITION_FIELDS, RUN_FIELDS,
};

#[derive(Debug, Default)]
struct Inner {
    definitions: HashMap<String, Definition>,
    runs: HashMap<String, Run>,
}

/// In-memory implementation of [`StateManager`].
///
/// All data is lost on process exit. Mirrors the Postgres manager's filter,
/// sort, and merge semantics so it can stand in for it in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateManager {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStateManager {
    pub fn new() -> Self {
        Self::default()
    }
}

// Empty child lists are stored as no rows by the Postgres manager, so reads
// produce `None`; normalize here to keep the two managers interchangeable.
fn normalize_definition(definition: &Definition) -> Definition {
    let mut d = definition.clone();
    if d.env.as_ref().is_some_and(|e| e.is_empty()) {
        d.env = None;
    }
    if d.ports.as_ref().is_some_and(|p| p.is_empty()) {
        d.ports = None;
    }
    d
}

fn normalize_run(run: &Run) -> Run {
    let mut r = run.clone();
    if r.env.as_ref().is_some_and(|e| e.is_empty()) {
        r.env = None;
    }
    r
}

// ── Filter / sort helpers ─────────────────────────────────────────────────────

fn definition_field(d: &Definition, field: &str) -> String {
    match field {
        "definition_id" => d.definition_id.clone(),
        "arn" => d.arn.clone(),
        "image" => d.image.clone(),
        "group_name" => d.group_name.clone(),
        "container_name" => d.container_name.clone(),
        "user" => d.user.clone(),
        "alias" => d.alias.clone(),
        "memory" => d.memory.to_string(),
        "command" => d.command.clone(),
        _ => String::new(),
    }
}

fn run_field(r: &Run, field: &str) -> String {
    match field {
        "run_id" => r.run_id.clone(),
        "definition_id" => r.definition_id.clone(),
        "cluster_name" => r.cluster_name.clone(),
        "status" => r.status.as_str().to_string(),
        "task_arn" => r.task_arn.clone(),
        "exit_code" => r.exit_code.map(|c| c.to_string()).unwrap_or_default(),
        "instance_id" => r.instance_id.clone(),
        "instance_dns_name" => r.instance_dns_name.clone(),
        "group_name" => r.group_name.clone(),
        "user" => r.user.clone(),
        _ => String::new(),
    }
}

fn definition_env(d: &Definition) -> Option<&EnvList> {
    d.env.as_ref()
}

fn run_env(r: &Run) -> Option<&EnvList> {
    r.env.as_ref()
}

fn matches_query<T>(
    item: &T,
    query: &ListQuery,
    entity: &EntityFields,
    field: fn(&T, &str) -> String,
    env: fn(&T) -> Option<&EnvList>,
) -> bool {
    for (key, value) in &query.filters {
        let actual = field(item, key);
        let matched = if entity.like_fields.contains(&key.as_str()) {
            actual.contains(value.as_str())
        } else {
            actual == *value
        };
        if !matched {
            return false;
        }
    }
    for (name, value) in &query.env_filters {
        match env(item) {
            Some(list) if list.contains_pair(name, value) => {}
            _ => return false,
        }
    }
    true
}

fn paginate<T>(mut items: Vec<T>, query: &ListQuery) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let start = query.offset.min(items.len());
    let end = (query.offset + query.limit).min(items.len());
    items.drain(..start);
    items.truncate(end - start);
    (items, total)
}

fn compare_definitions(a: &Definition, b: &Definition, field: &str) -> Ordering {
    match field {
        "memory" => a.memory.cmp(&b.memory),
        _ => definition_field(a, field).cmp(&definition_field(b, field)),
    }
}

fn compare_runs(a: &Run, b: &Run, field: &str) -> Ordering {
    match field {
        "started_at" => a.started_at.cmp(&b.started_at),
        "finished_at" => a.finished_at.cmp(&b.finished_at),
        _ => run_field(a, field).cmp(&run_field(b, field)),
    }
}

// ── StateManager implementation ───────────────────────────────────────────────

#[async_trait]
impl StateManager for InMemoryStateManager {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create_definition(&self, definition: &Definition) -> Result<(), StateError> {
        let mut guard = self.inner.write().await;
        if guard.definitions.contains_key(&definition.definition_id) {
            return Err(StateError::Conflict(format!(
                "definition {} already exists",
                definition.definition_id
            )));
        }
        guard
            .definitions
            .insert(definition.definition_id.clone(), normalize_definition(definition));
        Ok(())
    }

    async fn get_definition(&self, definition_id: &str) -> Result<Definition, StateError> {
        let guard = self.inner.read().await;
        guard
            .definitions
            .get(definition_id)
            .cloned()
            .ok_or_else(|| StateError::DefinitionNotFound(definition_id.to_string()))
    }

    async fn update_definition(
        &self,
        definition_id: &str,
        updates: DefinitionUpdates,
    ) -> Result<Definition, StateError> {
        let mut guard = self.inner.write().await;
        let existing = guard
            .definitions
            .get_mut(definition_id)
            .ok_or_else(|| StateError::DefinitionNotFound(definition_id.to_string()))?;
        updates.apply_to(existing);
        let normalized = normalize_definition(existing);
        *existing = normalized.clone();
        Ok(normalized)
    }

    async fn delete_definition(&self, definition_id: &str) -> Result<(), StateError> {
        let mut guard = self.inner.write().await;
        if guard.definitions.remove(definition_id).is_none() {
            return Err(StateError::DefinitionNotFound(definition_id.to_string()));
        }
        guard.runs.retain(|_, r| r.definition_id != definition_id);
        Ok(())
    }

    async fn list_definitions(&self, query: &ListQuery) -> Result<DefinitionList, StateError> {
        validate_query(query, &DEFINITION_FIELDS)?;
        let guard = self.inner.read().await;

        let mut matched: Vec<Definition> = guard
            .definitions
            .values()
            .filter(|d| matches_query(*d, query, &DEFINITION_FIELDS, definition_field, definition_env))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let ord = compare_definitions(a, b, &query.sort_by);
            if query.order == "desc" {
                ord.reverse()
            } else {
                ord
            }
        });

        let (definitions, total) = paginate(matched, query);
        Ok(DefinitionList { definitions, total })
    }

    async fn create_run(&self, run: &Run) -> Result<(), StateError> {
        let mut guard = self.inner.write().await;
        if guard.runs.contains_key(&run.run_id) {
            return Err(StateError::Conflict(format!(
                "run {} already exists",
                run.run_id
            )));
        }
        guard.runs.insert(run.run_id.clone(), normalize_run(run));
        Ok(())
    }

    async fn get_run(&self, run_id: &str) -> Result<Run, StateError> {
        let guard = self.inner.read().await;
        guard
            .runs
            .get(run_id)
            .cloned()
            .ok_or_else(|| StateError::RunNotFound(run_id.to_string()))
    }

    async fn update_run(&self, run_id: &str, updates: RunUpdates) -> Result<Run, StateError> {
        let mut guard = self.inner.write().await;
        let existing = guard
            .runs
            .get_mut(run_id)
            .ok_or_else(|| StateError::RunNotFound(run_id.to_string()))?;
        updates.apply_to(existing);
        let normalized = normalize_run(existing);
        *existing = normalized.clone();
        Ok(normalized)
    }

    async fn list_runs(&self, query: &ListQuery) -> Result<RunList, StateError> {
        validate_query(query, &RUN_FIELDS)?;
        let guard = self.inner.read().await;

        let mut matched: Vec<Run> = guard
            .runs
            .values()
            .filter(|r| matches_query(*r, query, &RUN_FIELDS, run_field, run_env))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let ord = compare_runs(a, b, &query.sort_by);
            if query.order == "desc" {
                ord.reverse()
            } else {
                ord
            }
        });

        let (runs, total) = paginate(matched, query);
        Ok(RunList { runs, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_domain::{new_run_id, EnvVar, PortsList, RunStatus};

    fn dummy_definition(id: &str) -> Definition {
        Definition {
            definition_id: id.to_string(),
            image: format!("repo/{id}:latest"),
            group_name: "grp".into(),
            alias: format!("{id}-alias"),
            memory: 512,
            command: "true".into(),
            env: Some(EnvList(vec![EnvVar::new("NAME", id)])),
            ports: Some(PortsList(vec![8080])),
            ..Default::default()
        }
    }

    fn dummy_run(definition_id: &str, cluster: &str) -> Run {
        Run {
            run_id: new_run_id(),
            definition_id: definition_id.to_string(),
            cluster_name: cluster.to_string(),
            status: RunStatus::Queued,
            group_name: "grp".into(),
            user: "alice".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn definition_round_trips() {
        let sm = InMemoryStateManager::new();
        let def = dummy_definition("rt");
        sm.create_definition(&def).await.unwrap();
        assert_eq!(sm.get_definition("rt").await.unwrap(), def);
    }

    #[tokio::test]
    async fn empty_child_lists_normalize_to_none() {
        let sm = InMemoryStateManager::new();
        let mut def = dummy_definition("empty");
        def.env = Some(EnvList::new());
        def.ports = Some(PortsList(vec![]));
        sm.create_definition(&def).await.unwrap();

        let fetched = sm.get_definition("empty").await.unwrap();
        assert_eq!(fetched.env, None);
        assert_eq!(fetched.ports, None);
    }

    #[tokio::test]
    async fn duplicate_definition_conflicts() {
        let sm = InMemoryStateManager::new();
        sm.create_definition(&dummy_definition("dup")).await.unwrap();
        let err = sm.create_definition(&dummy_definition("dup")).await.unwrap_err();
        assert!(matches!(err, StateError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_merges_and_replaces_env() {
        let sm = InMemoryStateManager::new();
        let def = dummy_definition("upd");
        sm.create_definition(&def).await.unwrap();

        let updated = sm
            .update_definition(
                "upd",
                DefinitionUpdates {
                    memory: Some(2048),
                    env: Some(EnvList(vec![EnvVar::new("REPLACED", "yes")])),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.memory, 2048);
        assert_eq!(updated.image, def.image);
        assert_eq!(updated.env, Some(EnvList(vec![EnvVar::new("REPLACED", "yes")])));
        assert_eq!(updated.ports, def.ports);
    }

    #[tokio::test]
    async fn update_missing_definition_not_found() {
        let sm = InMemoryStateManager::new();
        let err = sm
            .update_definition("ghost", DefinitionUpdates::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StateError::DefinitionNotFound(_)));
    }

    #[tokio::test]
    async fn cascade_delete_removes_runs() {
        let sm = InMemoryStateManager::new();
        sm.create_definition(&dummy_definition("doomed")).await.unwrap();
        sm.create_definition(&dummy_definition("spared")).await.unwrap();
        let doomed_run = dummy_run("doomed", "c1");
        let spared_run = dummy_run("spared", "c1");
        sm.create_run(&doomed_run).await.unwrap();
        sm.create_run(&spared_run).await.unwrap();

        sm.delete_definition("doomed").await.unwrap();

        assert!(matches!(
            sm.get_run(&doomed_run.run_id).await.unwrap_err(),
            StateError::RunNotFound(_)
        ));
        assert!(sm.get_run(&spared_run.run_id).await.is_ok());
    }

    #[tokio::test]
    async fn list_filters_substring_and_equality() {
        let sm = InMemoryStateManager::new();
        let mut a = dummy_definition("a");
        a.image = "repo/alpha:1".into();
        let mut b = dummy_definition("b");
        b.image = "repo/beta:1".into();
        b.memory = 4096;
        sm.create_definition(&a).await.unwrap();
        sm.create_definition(&b).await.unwrap();

        let page = sm
            .list_definitions(&ListQuery::new(10, 0, "alias", "asc").with_filter("image", "alpha"))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.definitions[0].definition_id, "a");

        let page = sm
            .list_definitions(&ListQuery::new(10, 0, "alias", "asc").with_filter("memory", "4096"))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.definitions[0].definition_id, "b");
    }

    #[tokio::test]
    async fn list_env_filters_require_exact_pair() {
        let sm = InMemoryStateManager::new();
        sm.create_definition(&dummy_definition("x")).await.unwrap();
        sm.create_definition(&dummy_definition("y")).await.unwrap();

        let page = sm
            .list_definitions(&ListQuery::new(10, 0, "alias", "asc").with_env_filter("NAME", "x"))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.definitions[0].definition_id, "x");

        let page = sm
            .list_definitions(
                &ListQuery::new(10, 0, "alias", "asc").with_env_filter("NAME", "nope"),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn list_rejects_bad_sort_field_and_order() {
        let sm = InMemoryStateManager::new();
        assert!(matches!(
            sm.list_definitions(&ListQuery::new(10, 0, "banana", "asc"))
                .await
                .unwrap_err(),
            StateError::Malformed(_)
        ));
        assert!(matches!(
            sm.list_runs(&ListQuery::new(10, 0, "status", "upwards"))
                .await
                .unwrap_err(),
            StateError::Malformed(_)
        ));
    }

    #[tokio::test]
    async fn list_rejects_unknown_filter_key() {
        let sm = InMemoryStateManager::new();
        let err = sm
            .list_runs(&ListQuery::new(10, 0, "status", "asc").with_filter("alias", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StateError::Malformed(_)));
    }

    #[tokio::test]
    async fn list_sorts_memory_numerically_and_paginates() {
        let sm = InMemoryStateManager::new();
        for (id, memory) in [("m1", 512), ("m2", 4096), ("m3", 1024)] {
            let mut def = dummy_definition(id);
            def.memory = memory;
            sm.create_definition(&def).await.unwrap();
        }

        let page = sm
            .list_definitions(&ListQuery::new(2, 0, "memory", "desc"))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        let ids: Vec<&str> = page.definitions.iter().map(|d| d.definition_id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m3"]);

        let page = sm
            .list_definitions(&ListQuery::new(2, 2, "memory", "desc"))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.definitions[0].definition_id, "m1");
    }

    #[tokio::test]
    async fn list_runs_filters_by_status_and_cluster() {
        let sm = InMemoryStateManager::new();
        sm.create_definition(&dummy_definition("d")).await.unwrap();
        let mut queued = dummy_run("d", "c1");
        queued.status = RunStatus::Queued;
        let mut stopped = dummy_run("d", "c2");
        stopped.status = RunStatus::Stopped;
        sm.create_run(&queued).await.unwrap();
        sm.create_run(&stopped).await.unwrap();

        let page = sm
            .list_runs(&ListQuery::new(10, 0, "run_id", "asc").with_filter("status", "QUEUED"))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.runs[0].run_id, queued.run_id);

        let page = sm
            .list_runs(&ListQuery::new(10, 0, "run_id", "asc").with_filter("cluster_name", "c2"))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.runs[0].run_id, stopped.run_id);
    }

    #[tokio::test]
    async fn run_update_preserves_unrelated_fields() {
        let sm = InMemoryStateManager::new();
        sm.create_definition(&dummy_definition("d")).await.unwrap();
        let mut run = dummy_run("d", "c1");
        run.status = RunStatus::Running;
        run.env = Some(EnvList(vec![EnvVar::new("KEEP", "me")]));
        sm.create_run(&run).await.unwrap();

        let updated = sm
            .update_run(
                &run.run_id,
                RunUpdates {
                    status: Some(RunStatus::Stopped),
                    exit_code: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, RunStatus::Stopped);
        assert_eq!(updated.exit_code, Some(0));
        assert_eq!(updated.cluster_name, "c1");
        assert_eq!(updated.env, Some(EnvList(vec![EnvVar::new("KEEP", "me")])));
    }
}
