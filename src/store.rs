use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::state::{Delta, Snapshot, apply_delta};

/// Owner of the current [`Snapshot`]. Cancellation is checked under the
/// write lock, so a cancelled token can never land a write.
pub struct SnapshotStore {
    tx: watch::Sender<Arc<Snapshot>>,
    token: CancellationToken,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Snapshot::new()));
        Self {
            tx,
            token: CancellationToken::new(),
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.tx.subscribe()
    }

    /// Token cancelled together with the store.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Applies `delta` unless the store has been disposed.
    pub fn apply(&self, delta: Delta) -> bool {
        let token = self.token.clone();
        self.apply_guarded(&token, delta)
    }

    /// Applies `delta` only while `token` is live. Returns whether the
    /// snapshot was replaced.
    pub fn apply_guarded(&self, token: &CancellationToken, delta: Delta) -> bool {
        self.tx.send_if_modified(|current| {
            if token.is_cancelled() {
                return false;
            }
            let mut next = (**current).clone();
            apply_delta(&mut next, delta);
            *current = Arc::new(next);
            true
        })
    }

    /// Cancels `token` while holding the write lock. Once this returns, no
    /// [`apply_guarded`](Self::apply_guarded) call with that token can land.
    pub fn cancel_guarded(&self, token: &CancellationToken) {
        self.tx.send_if_modified(|_| {
            token.cancel();
            false
        });
    }

    pub fn dispose(&self) {
        if self.token.is_cancelled() {
            return;
        }
        self.cancel_guarded(&self.token);
        info!("snapshot store disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.token.is_cancelled()
    }
}
