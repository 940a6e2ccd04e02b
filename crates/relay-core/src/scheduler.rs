//! Deferred and background work owned by the engine.
//!
//! - Warning messages are deleted after a delay; each deletion is a cancellable
//!   task and all pending deletions are dropped on shutdown.
//! - Broadcasts run in the background so the owner's chat stays responsive;
//!   shutdown waits for them to finish (they cannot be aborted).

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{domain::MessageRef, messaging::port::MessagingPort};

/// Handle to one scheduled deletion.
#[derive(Clone, Debug)]
pub struct ScheduledTask {
    cancel: CancellationToken,
}

impl ScheduledTask {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[derive(Clone, Debug, Default)]
pub struct TaskScheduler {
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete `msg` after `after`, unless cancelled first. Deletion errors are
    /// swallowed: the message may already be gone.
    pub fn schedule_delete(
        &self,
        port: Arc<dyn MessagingPort>,
        msg: MessageRef,
        after: Duration,
    ) -> ScheduledTask {
        let cancel = self.shutdown.child_token();
        let token = cancel.clone();

        self.tracker.spawn(async move {
            tokio::select! {
              _ = token.cancelled() => {
                tracing::debug!(chat_id = msg.chat_id.0, message_id = msg.message_id.0, "scheduled delete cancelled");
              }
              _ = sleep(after) => {
                if let Err(e) = port.delete_message(msg).await {
                    tracing::debug!(chat_id = msg.chat_id.0, error = %e, "scheduled delete failed");
                }
              }
            }
        });

        ScheduledTask { cancel }
    }

    /// Run background work that shutdown waits for.
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(fut);
    }

    /// Number of tasks still running or waiting.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Cancel pending deletions and wait for every tracked task.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}
