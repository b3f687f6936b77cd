use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::repo::ApiKeyRepo;

pub const QUEUE_CAPACITY: usize = 1024;

/// Records key usage off the request path.
///
/// Writes are best effort: a full queue or a failed update is logged and dropped.
#[derive(Clone)]
pub struct LastUsedTracker {
    tx: mpsc::Sender<(Uuid, OffsetDateTime)>,
}

impl LastUsedTracker {
    /// Spawns the writer task; it exits once every tracker clone is dropped.
    pub fn spawn(repo: Arc<dyn ApiKeyRepo>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<(Uuid, OffsetDateTime)>(capacity);
        tokio::spawn(async move {
            while let Some((id, at)) = rx.recv().await {
                if let Err(e) = repo.touch_last_used(id, at).await {
                    warn!(error = ?e, key_id = %id, "failed to record api key usage");
                }
            }
            debug!("last-used writer stopped");
        });
        Self { tx }
    }

    pub fn record(&self, key_id: Uuid) {
        match self.tx.try_send((key_id, OffsetDateTime::now_utc())) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(%key_id, "last-used queue full, dropping update");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(%key_id, "last-used writer is gone, dropping update");
            }
        }
    }
}
