use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::state::{IdentityHandle, MatchSummary, UserProfile};

/// Opaque upstream account id (a puuid) used for match lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountHandle(pub String);

impl AccountHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn get_profile(&self, identity: &IdentityHandle) -> Result<UserProfile, FetchError>;
}

#[async_trait]
pub trait MatchSource: Send + Sync {
    async fn resolve_account(
        &self,
        identity: &IdentityHandle,
        region: &str,
    ) -> Result<AccountHandle, FetchError>;

    /// Most recent first.
    async fn recent_match_ids(
        &self,
        account: &AccountHandle,
        count: usize,
        region: &str,
    ) -> Result<Vec<String>, FetchError>;

    /// Per-match detail, reduced to the summary of `account`'s participation.
    async fn match_detail(
        &self,
        match_id: &str,
        account: &AccountHandle,
        region: &str,
    ) -> Result<MatchSummary, FetchError>;
}

#[async_trait]
pub trait LiveGameSource: Send + Sync {
    /// `true` while the player has a game in progress.
    async fn live_game(&self, identity: &IdentityHandle, region: &str) -> Result<bool, FetchError>;
}

/// The three upstream dependencies of a session.
#[derive(Clone)]
pub struct Sources {
    pub profiles: Arc<dyn ProfileSource>,
    pub matches: Arc<dyn MatchSource>,
    pub live: Arc<dyn LiveGameSource>,
}

impl Sources {
    /// Uses one backend for all three roles.
    pub fn single<B>(backend: Arc<B>) -> Self
    where
        B: ProfileSource + MatchSource + LiveGameSource + 'static,
    {
        Self {
            profiles: backend.clone(),
            matches: backend.clone(),
            live: backend,
        }
    }
}
