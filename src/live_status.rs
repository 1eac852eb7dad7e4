use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::sources::LiveGameSource;
use crate::state::{Delta, IdentityHandle, LiveStatus};
use crate::store::SnapshotStore;
use crate::timeout_guard::TimeoutGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Polling,
    Disposed,
}

struct PollerInner {
    state: PollerState,
    task: Option<JoinHandle<()>>,
}

#[derive(Clone)]
struct PollTask {
    source: Arc<dyn LiveGameSource>,
    identity: IdentityHandle,
    region: String,
    guard: TimeoutGuard,
    interval: Duration,
    store: Arc<SnapshotStore>,
    token: CancellationToken,
}

pub struct LiveStatusPoller {
    task: PollTask,
    inner: Mutex<PollerInner>,
}

impl LiveStatusPoller {
    pub fn new(
        source: Arc<dyn LiveGameSource>,
        identity: IdentityHandle,
        region: impl Into<String>,
        deadline: Duration,
        interval: Duration,
        store: Arc<SnapshotStore>,
    ) -> Self {
        let token = store.child_token();
        Self {
            task: PollTask {
                source,
                identity,
                region: region.into(),
                guard: TimeoutGuard::new(deadline),
                interval,
                store,
                token,
            },
            inner: Mutex::new(PollerInner {
                state: PollerState::Idle,
                task: None,
            }),
        }
    }

    pub fn state(&self) -> PollerState {
        self.lock().state
    }

    /// Idle → Polling. Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut inner = self.lock();
        if inner.state != PollerState::Idle {
            return;
        }
        if self.task.token.is_cancelled() {
            inner.state = PollerState::Disposed;
            return;
        }
        info!(
            identity = %self.task.identity,
            interval_secs = self.task.interval.as_secs(),
            "live status polling started"
        );
        inner.task = Some(tokio::spawn(self.task.clone().run()));
        inner.state = PollerState::Polling;
    }

    pub fn dispose(&self) {
        let mut inner = self.lock();
        if inner.state == PollerState::Disposed {
            return;
        }
        self.task.store.cancel_guarded(&self.task.token);
        if let Some(task) = inner.task.take() {
            task.abort();
        }
        inner.state = PollerState::Disposed;
        info!(identity = %self.task.identity, "live status polling stopped");
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PollerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for LiveStatusPoller {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl PollTask {
    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let tick = poll_once(self.source.as_ref(), &self.identity, &self.region, self.guard);
            let status = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                status = tick => status,
            };
            if !self
                .store
                .apply_guarded(&self.token, Delta::SetLiveStatus(status))
            {
                break;
            }
        }
        debug!(identity = %self.identity, "live status task exited");
    }
}

/// One tick: any failure, timeouts included, reads as "not in game".
pub async fn poll_once(
    source: &dyn LiveGameSource,
    identity: &IdentityHandle,
    region: &str,
    guard: TimeoutGuard,
) -> LiveStatus {
    match guard.run(source.live_game(identity, region)).await {
        Ok(true) => LiveStatus::InGame,
        Ok(false) => LiveStatus::NotInGame,
        Err(err) => {
            debug!(%identity, error = %err, "live status check failed");
            LiveStatus::NotInGame
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    struct Scripted {
        calls: AtomicUsize,
        delay: Duration,
        answer: Result<bool, FetchError>,
    }

    impl Scripted {
        fn new(answer: Result<bool, FetchError>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
                answer,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LiveGameSource for Scripted {
        async fn live_game(&self, _: &IdentityHandle, _: &str) -> Result<bool, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            sleep(self.delay).await;
            self.answer.clone()
        }
    }

    fn poller(source: Arc<Scripted>, store: Arc<SnapshotStore>) -> LiveStatusPoller {
        LiveStatusPoller::new(
            source,
            IdentityHandle::new("Not Alet", "JCP"),
            "las",
            Duration::from_secs(5),
            Duration::from_secs(30),
            store,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_is_immediate_then_every_interval() {
        let source = Scripted::new(Ok(true), Duration::ZERO);
        let store = Arc::new(SnapshotStore::new());
        let mut rx = store.subscribe();
        let poller = poller(source.clone(), store.clone());

        poller.start();
        rx.changed().await.unwrap();
        assert_eq!(source.calls(), 1);
        assert_eq!(store.snapshot().live_status, LiveStatus::InGame);
        assert!(store.snapshot().live_checked_at.is_some());

        sleep(Duration::from_secs(61)).await;
        assert_eq!(source.calls(), 3);
        poller.dispose();
    }

    #[tokio::test(start_paused = true)]
    async fn failures_read_as_not_in_game() {
        let source = Scripted::new(
            Err(FetchError::ServiceUnavailable("down".to_string())),
            Duration::ZERO,
        );
        let store = Arc::new(SnapshotStore::new());
        let mut rx = store.subscribe();
        let poller = poller(source, store.clone());

        poller.start();
        rx.changed().await.unwrap();
        assert_eq!(store.snapshot().live_status, LiveStatus::NotInGame);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out_to_not_in_game() {
        let source = Scripted::new(Ok(true), Duration::from_secs(60));
        let status = poll_once(
            source.as_ref(),
            &IdentityHandle::new("Not Alet", "JCP"),
            "las",
            TimeoutGuard::new(Duration::from_secs(5)),
        )
        .await;
        assert_eq!(status, LiveStatus::NotInGame);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_mid_flight_keeps_status_unchanged() {
        let source = Scripted::new(Ok(true), Duration::from_secs(2));
        let store = Arc::new(SnapshotStore::new());
        let poller = poller(source.clone(), store.clone());

        poller.start();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(source.calls(), 1);

        poller.dispose();
        poller.dispose();
        assert_eq!(poller.state(), PollerState::Disposed);

        sleep(Duration::from_secs(120)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(store.snapshot().live_status, LiveStatus::Checking);
        assert!(store.snapshot().live_checked_at.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_a_no_op_unless_idle() {
        let source = Scripted::new(Ok(false), Duration::ZERO);
        let store = Arc::new(SnapshotStore::new());
        let poller = poller(source.clone(), store.clone());

        poller.dispose();
        poller.start();
        assert_eq!(poller.state(), PollerState::Disposed);
        sleep(Duration::from_secs(90)).await;
        assert_eq!(source.calls(), 0);

        let again = self::poller(source.clone(), store);
        again.start();
        again.start();
        assert_eq!(again.state(), PollerState::Polling);
    }

    #[tokio::test(start_paused = true)]
    async fn store_disposal_stops_the_task() {
        let source = Scripted::new(Ok(false), Duration::ZERO);
        let store = Arc::new(SnapshotStore::new());
        let mut rx = store.subscribe();
        let poller = poller(source.clone(), store.clone());

        poller.start();
        rx.changed().await.unwrap();
        store.dispose();
        sleep(Duration::from_secs(90)).await;
        assert_eq!(source.calls(), 1);
    }
}
