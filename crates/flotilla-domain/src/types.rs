use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DomainError;

// ── Environment variables ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        EnvVar { name: name.into(), value: value.into() }
    }
}

/// Ordered list of environment variables. Names are unique within a list;
/// order is preserved through persistence and the queue message format.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvList(pub Vec<EnvVar>);

impl EnvList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnvVar> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, var: EnvVar) {
        self.0.push(var);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|e| e.name == name).map(|e| e.value.as_str())
    }

    /// True when the list contains exactly this name/value pair.
    pub fn contains_pair(&self, name: &str, value: &str) -> bool {
        self.0.iter().any(|e| e.name == name && e.value == value)
    }
}

impl From<Vec<EnvVar>> for EnvList {
    fn from(vars: Vec<EnvVar>) -> Self {
        EnvList(vars)
    }
}

impl<'a> IntoIterator for &'a EnvList {
    type Item = &'a EnvVar;
    type IntoIter = std::slice::Iter<'a, EnvVar>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Ordered list of container ports.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortsList(pub Vec<i32>);

impl PortsList {
    pub fn iter(&self) -> std::slice::Iter<'_, i32> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<i32>> for PortsList {
    fn from(ports: Vec<i32>) -> Self {
        PortsList(ports)
    }
}

// ── Run status ────────────────────────────────────────────────────────────────

/// Lifecycle status of a [`Run`]. `Stopped` is terminal; a run never moves
/// back to an earlier status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Queued,
    Pending,
    Running,
    Stopped,
}

impl RunStatus {
    /// Every status a run may carry, in lifecycle order.
    pub const ALL: &'static [RunStatus] = &[
        RunStatus::Queued,
        RunStatus::Pending,
        RunStatus::Running,
        RunStatus::Stopped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "QUEUED",
            RunStatus::Pending => "PENDING",
            RunStatus::Running => "RUNNING",
            RunStatus::Stopped => "STOPPED",
        }
    }

    pub fn parse(s: &str) -> Option<RunStatus> {
        match s {
            "QUEUED" => Some(RunStatus::Queued),
            "PENDING" => Some(RunStatus::Pending),
            "RUNNING" => Some(RunStatus::Running),
            "STOPPED" => Some(RunStatus::Stopped),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Stopped)
    }
}

impl Default for RunStatus {
    fn default() -> Self {
        RunStatus::Queued
    }
}

impl FromStr for RunStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RunStatus::parse(s).ok_or_else(|| DomainError::InvalidStatus(s.to_string()))
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Core structs ──────────────────────────────────────────────────────────────

/// A reusable container workload template.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub definition_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub arn: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub container_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
    #[serde(default)]
    pub memory: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<EnvList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<PortsList>,
}

/// One execution attempt of a [`Definition`] on a named cluster.
///
/// Serialized as the queue message body; empty fields are omitted and
/// unknown fields are ignored on the way back in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Run {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub run_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub definition_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster_name: String,
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub task_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instance_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instance_dns_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<EnvList>,
}

/// Allocate a fresh run id (UUID v4).
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
