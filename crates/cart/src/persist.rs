//! Single-writer persistence queue.
//!
//! Every cart mutation enqueues the serialized snapshot it produced. One
//! background task owns the storage handle and applies commands strictly in
//! the order they were sent, so the stored value always ends at the most
//! recently committed cart. Callers never wait on a write unless they ask to
//! with [`PersistQueue::flush`].
//!
//! Back-to-back writes are coalesced: when several snapshots are already
//! waiting, only the newest one is written.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, instrument, warn};

use crate::storage::KeyValueStore;

/// Commands processed by the writer task.
#[derive(Debug)]
enum PersistCommand {
    /// Overwrite the key with a serialized cart.
    Write(String),
    /// Delete the key.
    Remove,
    /// Acknowledge once everything sent before has been applied.
    Flush(oneshot::Sender<()>),
}

/// Handle to the background writer for one storage key.
///
/// Cheap to clone. The writer task exits once every handle is dropped and the
/// remaining commands have been applied.
#[derive(Debug, Clone)]
pub struct PersistQueue {
    tx: mpsc::UnboundedSender<PersistCommand>,
}

impl PersistQueue {
    /// Spawn the writer task for `key` on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    #[must_use]
    pub fn spawn(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let key = key.into();
        tokio::spawn(run_writer(storage, key, rx));
        Self { tx }
    }

    /// Queue a serialized cart to be written. Returns immediately.
    pub fn write(&self, value: String) {
        self.send(PersistCommand::Write(value));
    }

    /// Queue removal of the stored cart. Returns immediately.
    pub fn remove(&self) {
        self.send(PersistCommand::Remove);
    }

    /// Wait until every command queued before this call has been applied.
    ///
    /// Failed writes still count as applied; they are logged by the writer.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        self.send(PersistCommand::Flush(ack));
        if done.await.is_err() {
            warn!("Persistence writer stopped before flush completed");
        }
    }

    fn send(&self, command: PersistCommand) {
        if self.tx.send(command).is_err() {
            error!("Persistence writer is gone, dropping cart write");
        }
    }
}

#[instrument(skip_all, fields(key = %key))]
async fn run_writer(
    storage: Arc<dyn KeyValueStore>,
    key: String,
    mut rx: mpsc::UnboundedReceiver<PersistCommand>,
) {
    debug!("Persistence writer started");
    let mut pending: Option<PersistCommand> = None;

    loop {
        let command = match pending.take() {
            Some(command) => command,
            None => match rx.recv().await {
                Some(command) => command,
                None => break,
            },
        };

        match command {
            PersistCommand::Write(mut value) => {
                // Skip over snapshots that are already stale.
                while let Ok(next) = rx.try_recv() {
                    match next {
                        PersistCommand::Write(newer) => value = newer,
                        other => {
                            pending = Some(other);
                            break;
                        }
                    }
                }

                match storage.set(&key, &value).await {
                    Ok(()) => debug!(bytes = value.len(), "Persisted cart"),
                    Err(e) => error!(error = %e, "Failed to persist cart"),
                }
            }
            PersistCommand::Remove => match storage.remove(&key).await {
                Ok(()) => debug!("Removed persisted cart"),
                Err(e) => error!(error = %e, "Failed to remove persisted cart"),
            },
            PersistCommand::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    debug!("Persistence writer stopped");
}
