use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::SessionConfig;
use crate::live_status::LiveStatusPoller;
use crate::match_history::MatchHistoryAggregator;
use crate::profile::{ProfileOutcome, ProfileResolver};
use crate::riot_fetch::HttpBackend;
use crate::sources::Sources;
use crate::state::{Delta, IdentityHandle, ProfileSlot, Snapshot};
use crate::store::SnapshotStore;

/// Lifecycle owner for one dashboard: resolves the profile, aggregates its
/// history, runs the live-status poller and publishes everything through a
/// single [`SnapshotStore`].
pub struct Session {
    identity: IdentityHandle,
    profiles: ProfileResolver,
    history: MatchHistoryAggregator,
    store: Arc<SnapshotStore>,
    poller: LiveStatusPoller,
}

impl Session {
    pub fn new(config: &SessionConfig, sources: Sources) -> Self {
        let store = Arc::new(SnapshotStore::new());
        let poller = LiveStatusPoller::new(
            sources.live,
            config.identity.clone(),
            config.region.clone(),
            config.live_timeout,
            config.live_poll_interval,
            store.clone(),
        );
        Self {
            identity: config.identity.clone(),
            profiles: ProfileResolver::new(
                sources.profiles,
                config.profile_timeout,
                config.identity.clone(),
                config.region.clone(),
            ),
            history: MatchHistoryAggregator::standard(
                sources.matches,
                config.history_timeout,
                config.match_count,
            ),
            store,
            poller,
        }
    }

    /// Session backed by the HTTP companion service at `config.api_base_url`.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        let backend = Arc::new(HttpBackend::new(&config.api_base_url)?);
        Ok(Self::new(config, Sources::single(backend)))
    }

    pub fn identity(&self) -> &IdentityHandle {
        &self.identity
    }

    /// Starts live-status polling. Must be called from within a tokio runtime.
    pub fn start(&self) {
        if self.store.is_disposed() {
            return;
        }
        info!(identity = %self.identity, "session started");
        self.store
            .apply(Delta::Log(format!("[INFO] tracking {}", self.identity)));
        self.poller.start();
    }

    /// Re-runs profile resolution and history aggregation, then publishes the
    /// result as one write. A disposal during the run discards the result.
    pub async fn refresh(&self) -> Arc<Snapshot> {
        let token = self.store.token().clone();
        if !self.store.apply_guarded(&token, Delta::BeginRefresh) {
            return self.store.snapshot();
        }
        info!(identity = %self.identity, "refresh started");

        let slot = tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!(identity = %self.identity, "refresh abandoned, session disposed");
                return self.store.snapshot();
            }
            slot = self.load_profile_slot() => slot,
        };

        if !self.store.apply_guarded(&token, Delta::SetProfileSlot(slot)) {
            info!(identity = %self.identity, "refresh result discarded, session disposed");
        }
        self.store.snapshot()
    }

    async fn load_profile_slot(&self) -> ProfileSlot {
        let outcome = self.profiles.resolve(&self.identity).await;
        let profile_quality = outcome.quality();
        let degraded = outcome.is_degraded();
        let profile = match outcome {
            ProfileOutcome::Failed(err) => {
                warn!(identity = %self.identity, error = %err, "refresh failed");
                let mut slot = ProfileSlot::failed(err.to_string());
                slot.notices
                    .push(format!("[WARN] profile unavailable for {}: {err}", self.identity));
                return slot;
            }
            ProfileOutcome::Live(profile) | ProfileOutcome::Degraded(profile) => profile,
        };

        let mut notices = Vec::new();
        if degraded {
            notices.push(
                "[WARN] profile service timed out, using cached/basic information".to_string(),
            );
        }

        let history = self.history.aggregate(&profile).await;
        if history.quality.is_degraded() {
            notices.push(format!(
                "[WARN] match history degraded ({}), showing {} {} entries",
                history.tier,
                history.matches.len(),
                history.quality.label()
            ));
        }
        notices.push(format!(
            "[INFO] loaded {} matches for {}",
            history.matches.len(),
            profile.identity
        ));

        ProfileSlot {
            profile: Some(profile),
            profile_quality,
            matches: history.matches,
            history_quality: history.quality,
            history_tier: Some(history.tier.to_string()),
            error: None,
            notices,
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.store.subscribe()
    }

    /// Stops the poller and fences off every pending write. Idempotent.
    pub fn dispose(&self) {
        if self.store.is_disposed() {
            return;
        }
        self.poller.dispose();
        self.store.dispose();
        info!(identity = %self.identity, "session disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.store.is_disposed()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.dispose();
    }
}
