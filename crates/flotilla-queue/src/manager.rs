use async_trait::async_trait;
use flotilla_domain::Run;

use crate::error::QueueError;

/// Acknowledgement callback bound to one delivered message. Invoking it
/// permanently removes the message from its queue; a message that is never
/// acknowledged is redelivered after the visibility timeout.
#[async_trait]
pub trait Acknowledge: Send + Sync {
    async fn done(&self) -> Result<(), QueueError>;
}

/// Result of a [`QueueManager::receive`] call.
///
/// `run` is `None` when the queue was empty. A message whose body could not
/// be decoded still carries its acknowledgement (`decode_error` set, `run`
/// absent) so the worker's poison-message policy can drop it.
pub struct RunReceipt {
    pub run: Option<Run>,
    pub decode_error: Option<String>,
    acker: Option<Box<dyn Acknowledge>>,
}

impl std::fmt::Debug for RunReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunReceipt")
            .field("run", &self.run)
            .field("decode_error", &self.decode_error)
            .field("acker", &self.acker.as_ref().map(|_| "Acknowledge"))
            .finish()
    }
}

impl RunReceipt {
    /// Receipt for an empty queue; there is nothing to acknowledge.
    pub fn empty() -> Self {
        RunReceipt { run: None, decode_error: None, acker: None }
    }

    pub fn delivered(run: Run, acker: Box<dyn Acknowledge>) -> Self {
        RunReceipt { run: Some(run), decode_error: None, acker: Some(acker) }
    }

    pub fn undecodable(error: impl Into<String>, acker: Box<dyn Acknowledge>) -> Self {
        RunReceipt {
            run: None,
            decode_error: Some(error.into()),
            acker: Some(acker),
        }
    }

    /// Acknowledge receipt -and- processing of the delivered message.
    pub async fn done(&self) -> Result<(), QueueError> {
        match &self.acker {
            Some(acker) => acker.done().await,
            None => Err(QueueError::Malformed(
                "no message to acknowledge".to_string(),
            )),
        }
    }
}

/// Per-cluster work queues with at-least-once, acknowledgement-based
/// delivery. Queue names are prefixed with a namespace so multiple
/// deployments can share one back-end.
#[async_trait]
pub trait QueueManager: Send + Sync + 'static {
    /// Name of the queue manager, matching the value in configuration.
    fn name(&self) -> &'static str;

    /// Map a cluster name to its queue URL, creating the queue if absent.
    async fn qurl_for(&self, cluster_name: &str) -> Result<String, QueueError>;

    /// Submit a run to the queue at `qurl`.
    async fn enqueue(&self, qurl: &str, run: &Run) -> Result<(), QueueError>;

    /// Receive at most one run from the queue at `qurl`. The message stays
    /// invisible until acknowledged or until the visibility timeout lapses.
    async fn receive(&self, qurl: &str) -> Result<RunReceipt, QueueError>;

    /// Enumerate the queue URLs under this manager's namespace.
    async fn list(&self) -> Result<Vec<String>, QueueError>;
}
