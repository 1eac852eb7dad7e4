//! Recent match history, tried tier by tier until one yields entries.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::FetchError;
use crate::fallback;
use crate::sources::{AccountHandle, MatchSource};
use crate::state::{DataQuality, MatchSummary, UserProfile};
use crate::timeout_guard::TimeoutGuard;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchHistory {
    pub matches: Vec<MatchSummary>,
    pub quality: DataQuality,
    pub tier: &'static str,
}

#[derive(Debug, Default)]
pub struct TierContext {
    /// Outcome of the account-handle lookup, if some tier attempted it.
    pub account: Option<Result<AccountHandle, FetchError>>,
}

impl TierContext {
    pub fn account_resolved(&self) -> bool {
        matches!(self.account, Some(Ok(_)))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TierError {
    #[error("tier not applicable: {0}")]
    NotApplicable(&'static str),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[async_trait]
pub trait HistoryTier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(
        &self,
        profile: &UserProfile,
        ctx: &mut TierContext,
    ) -> Result<Vec<MatchSummary>, TierError>;
}

pub struct LiveHistoryTier {
    source: Arc<dyn MatchSource>,
    guard: TimeoutGuard,
    count: usize,
}

impl LiveHistoryTier {
    pub fn new(source: Arc<dyn MatchSource>, deadline: Duration, count: usize) -> Self {
        Self {
            source,
            guard: TimeoutGuard::new(deadline),
            count: count.max(1),
        }
    }

    async fn summary_for(
        &self,
        profile: &UserProfile,
        account: &AccountHandle,
        position: usize,
        match_id: &str,
    ) -> MatchSummary {
        let detail = self
            .guard
            .run(self.source.match_detail(match_id, account, &profile.region))
            .await;
        match detail {
            Ok(mut summary) => {
                summary.id = match_id.to_string();
                summary.quality = DataQuality::Live;
                summary
            }
            Err(err) => {
                warn!(%match_id, error = %err, "match detail unavailable, synthesizing entry");
                fallback::synthesize_summary(match_id, position, &profile.preferred_champions)
            }
        }
    }
}

#[async_trait]
impl HistoryTier for LiveHistoryTier {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn attempt(
        &self,
        profile: &UserProfile,
        ctx: &mut TierContext,
    ) -> Result<Vec<MatchSummary>, TierError> {
        let resolved = self
            .guard
            .run(self.source.resolve_account(&profile.identity, &profile.region))
            .await;
        ctx.account = Some(resolved.clone());
        let account = resolved?;

        let ids = self
            .guard
            .run(
                self.source
                    .recent_match_ids(&account, self.count, &profile.region),
            )
            .await?;

        let mut seen = HashSet::new();
        let ids = ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .take(self.count)
            .collect::<Vec<_>>();
        if ids.is_empty() {
            return Err(FetchError::NotFound(format!("no recent matches for {account}")).into());
        }

        let summaries = join_all(
            ids.iter()
                .enumerate()
                .map(|(pos, id)| self.summary_for(profile, &account, pos, id)),
        )
        .await;
        Ok(summaries)
    }
}

pub struct RegionalSampleTier;

#[async_trait]
impl HistoryTier for RegionalSampleTier {
    fn name(&self) -> &'static str {
        "regional-sample"
    }

    async fn attempt(
        &self,
        profile: &UserProfile,
        ctx: &mut TierContext,
    ) -> Result<Vec<MatchSummary>, TierError> {
        if !ctx.account_resolved() {
            return Err(TierError::NotApplicable("account handle unresolved"));
        }
        Ok(fallback::regional_sample(&profile.region))
    }
}

pub struct MinimalSampleTier;

#[async_trait]
impl HistoryTier for MinimalSampleTier {
    fn name(&self) -> &'static str {
        "minimal-sample"
    }

    async fn attempt(
        &self,
        _profile: &UserProfile,
        _ctx: &mut TierContext,
    ) -> Result<Vec<MatchSummary>, TierError> {
        Ok(fallback::minimal_sample())
    }
}

pub struct MatchHistoryAggregator {
    tiers: Vec<Box<dyn HistoryTier>>,
}

impl MatchHistoryAggregator {
    pub fn new(tiers: Vec<Box<dyn HistoryTier>>) -> Self {
        Self { tiers }
    }

    /// live → regional sample → minimal sample.
    pub fn standard(source: Arc<dyn MatchSource>, deadline: Duration, count: usize) -> Self {
        Self::new(vec![
            Box::new(LiveHistoryTier::new(source, deadline, count)),
            Box::new(RegionalSampleTier),
            Box::new(MinimalSampleTier),
        ])
    }

    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// Each tier is attempted at most once; the result is never empty.
    pub async fn aggregate(&self, profile: &UserProfile) -> MatchHistory {
        let mut ctx = TierContext::default();
        for tier in &self.tiers {
            match tier.attempt(profile, &mut ctx).await {
                Ok(matches) if !matches.is_empty() => {
                    let quality = history_quality(&matches);
                    info!(
                        tier = tier.name(),
                        matches = matches.len(),
                        quality = quality.label(),
                        "match history aggregated"
                    );
                    return MatchHistory {
                        matches,
                        quality,
                        tier: tier.name(),
                    };
                }
                Ok(_) => warn!(tier = tier.name(), "tier returned no matches"),
                Err(err) => warn!(tier = tier.name(), error = %err, "tier failed"),
            }
        }

        warn!("every history tier failed, using minimal sample");
        let matches = fallback::minimal_sample();
        MatchHistory {
            quality: history_quality(&matches),
            matches,
            tier: MinimalSampleTier.name(),
        }
    }
}

/// The worst entry quality decides the label of the whole sequence.
fn history_quality(matches: &[MatchSummary]) -> DataQuality {
    if matches.iter().any(|m| m.quality == DataQuality::Fallback) {
        DataQuality::Fallback
    } else if matches.iter().any(|m| m.quality == DataQuality::Partial) {
        DataQuality::Partial
    } else {
        DataQuality::Live
    }
}
