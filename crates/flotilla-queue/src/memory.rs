use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use flotilla_config::Config;
use flotilla_domain::Run;
use tokio::sync::Mutex;

use crate::error::QueueError;
use crate::manager::{Acknowledge, QueueManager, RunReceipt};

const DEFAULT_VISIBILITY: Duration = Duration::from_secs(45);

struct Message {
    id: u64,
    body: String,
    /// While set and in the future, the message is hidden from receives.
    invisible_until: Option<Instant>,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    queues: HashMap<String, Vec<Message>>,
}

/// In-memory implementation of [`QueueManager`].
///
/// Delivery semantics match the SQS manager: at-least-once, one message per
/// receive, hidden until acknowledged or until the visibility window
/// lapses. All messages are lost on process exit.
#[derive(Clone)]
pub struct InMemoryQueueManager {
    namespace: String,
    visibility: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryQueueManager {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self::with_visibility(namespace, DEFAULT_VISIBILITY)
    }

    /// Construct with a custom visibility window; tests shrink it to
    /// exercise redelivery without waiting 45 seconds.
    pub fn with_visibility(namespace: impl Into<String>, visibility: Duration) -> Self {
        InMemoryQueueManager {
            namespace: namespace.into(),
            visibility,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Build a manager from configuration. Requires `queue.namespace`.
    pub fn initialize(conf: &Config) -> Result<Self, QueueError> {
        Ok(Self::new(conf.require("queue.namespace")?))
    }

    fn qurl_prefix(&self) -> String {
        format!("memory://{}-", self.namespace)
    }

    #[cfg(test)]
    async fn enqueue_raw(&self, qurl: &str, body: impl Into<String>) {
        let mut guard = self.inner.lock().await;
        let id = guard.next_id;
        guard.next_id += 1;
        guard.queues.entry(qurl.to_string()).or_default().push(Message {
            id,
            body: body.into(),
            invisible_until: None,
        });
    }
}

#[async_trait]
impl QueueManager for InMemoryQueueManager {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn qurl_for(&self, cluster_name: &str) -> Result<String, QueueError> {
        let qurl = format!("{}{}", self.qurl_prefix(), cluster_name);
        let mut guard = self.inner.lock().await;
        guard.queues.entry(qurl.clone()).or_default();
        Ok(qurl)
    }

    async fn enqueue(&self, qurl: &str, run: &Run) -> Result<(), QueueError> {
        if qurl.is_empty() {
            return Err(QueueError::Malformed(
                "no queue url specified, can't enqueue".to_string(),
            ));
        }
        let body = serde_json::to_string(run)?;
        let mut guard = self.inner.lock().await;
        let id = guard.next_id;
        guard.next_id += 1;
        guard.queues.entry(qurl.to_string()).or_default().push(Message {
            id,
            body,
            invisible_until: None,
        });
        Ok(())
    }

    async fn receive(&self, qurl: &str) -> Result<RunReceipt, QueueError> {
        if qurl.is_empty() {
            return Err(QueueError::Malformed(
                "no queue url specified, can't receive".to_string(),
            ));
        }

        let now = Instant::now();
        let mut guard = self.inner.lock().await;
        let visibility = self.visibility;
        let Some(queue) = guard.queues.get_mut(qurl) else {
            return Ok(RunReceipt::empty());
        };
        let Some(message) = queue
            .iter_mut()
            .find(|m| m.invisible_until.map_or(true, |until| until <= now))
        else {
            return Ok(RunReceipt::empty());
        };

        message.invisible_until = Some(now + visibility);
        let body = message.body.clone();
        let acker = Box::new(MemoryAcknowledgement {
            inner: self.inner.clone(),
            qurl: qurl.to_string(),
            id: message.id,
        });

        match serde_json::from_str::<Run>(&body) {
            Ok(run) => Ok(RunReceipt::delivered(run, acker)),
            Err(e) => Ok(RunReceipt::undecodable(e.to_string(), acker)),
        }
    }

    async fn list(&self) -> Result<Vec<String>, QueueError> {
        let guard = self.inner.lock().await;
        let prefix = self.qurl_prefix();
        let mut listed: Vec<String> = guard
            .queues
            .keys()
            .filter(|q| q.starts_with(&prefix))
            .cloned()
            .collect();
        listed.sort();
        Ok(listed)
    }
}

struct MemoryAcknowledgement {
    inner: Arc<Mutex<Inner>>,
    qurl: String,
    id: u64,
}

#[async_trait]
impl Acknowledge for MemoryAcknowledgement {
    async fn done(&self) -> Result<(), QueueError> {
        let mut guard = self.inner.lock().await;
        if let Some(queue) = guard.queues.get_mut(&self.qurl) {
            queue.retain(|m| m.id != self.id);
        }
        Ok(())
    }
}
