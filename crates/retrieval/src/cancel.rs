//! Cooperative cancellation for a discovery run.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;

/// A cloneable cancellation flag. Cancelling any clone cancels them all.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as any clone of this token, so
        // `wait_for` only fails if it never fires.
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Whether the token is cancelled or `deadline` has passed.
    pub fn is_stopped(&self, deadline: Option<Instant>) -> bool {
        self.is_cancelled() || deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the token is cancelled or `deadline` passes.
    pub async fn stopped(&self, deadline: Option<Instant>) {
        match deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancelled().await,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
