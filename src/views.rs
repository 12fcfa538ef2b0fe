use tokio::sync::mpsc::{self, error::TrySendError};

use crate::repository::PostRepositoryState;

/// ViewCounter
///
/// Records post views without holding up the request. Post ids go onto a
/// bounded queue drained by a single background task. When the queue is full
/// the view is dropped: view counts are approximate.
#[derive(Clone)]
pub struct ViewCounter {
    tx: mpsc::Sender<i64>,
}

impl ViewCounter {
    /// Builds the sending half and hands back the receiver for the caller to
    /// drain.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<i64>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// spawn
    ///
    /// Starts the worker on the current runtime.
    pub fn spawn(posts: PostRepositoryState, capacity: usize) -> Self {
        let (counter, rx) = Self::channel(capacity);
        tokio::spawn(drain(rx, posts));
        counter
    }

    /// record
    ///
    /// Never blocks. Returns whether the view was queued.
    pub fn record(&self, post_id: i64) -> bool {
        match self.tx.try_send(post_id) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::debug!(post_id, "view queue full, dropping view");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(post_id, "view worker stopped, dropping view");
                false
            }
        }
    }
}

/// drain
///
/// Applies queued views one by one until every sender is gone. Storage errors
/// are logged and skipped.
pub async fn drain(mut rx: mpsc::Receiver<i64>, posts: PostRepositoryState) {
    while let Some(post_id) = rx.recv().await {
        if let Err(e) = posts.increment_view_count(post_id).await {
            tracing::warn!(post_id, error = %e, "failed to record post view");
        }
    }
    tracing::debug!("view worker stopped");
}
