use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::FetchError;
use crate::fallback::fallback_profile;
use crate::sources::ProfileSource;
use crate::state::{DataQuality, IdentityHandle, UserProfile};
use crate::timeout_guard::TimeoutGuard;

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileOutcome {
    /// Fetched from the profile service.
    Live(UserProfile),
    /// The service timed out; the static profile for the default identity stands in.
    Degraded(UserProfile),
    /// Hard failure; nothing downstream should run.
    Failed(FetchError),
}

impl ProfileOutcome {
    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            ProfileOutcome::Live(p) | ProfileOutcome::Degraded(p) => Some(p),
            ProfileOutcome::Failed(_) => None,
        }
    }

    pub fn quality(&self) -> DataQuality {
        match self {
            ProfileOutcome::Live(_) => DataQuality::Live,
            ProfileOutcome::Degraded(_) | ProfileOutcome::Failed(_) => DataQuality::Fallback,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ProfileOutcome::Degraded(_))
    }
}

pub struct ProfileResolver {
    source: Arc<dyn ProfileSource>,
    guard: TimeoutGuard,
    default_identity: IdentityHandle,
    default_region: String,
}

impl ProfileResolver {
    pub fn new(
        source: Arc<dyn ProfileSource>,
        deadline: Duration,
        default_identity: IdentityHandle,
        default_region: impl Into<String>,
    ) -> Self {
        Self {
            source,
            guard: TimeoutGuard::new(deadline),
            default_identity,
            default_region: default_region.into(),
        }
    }

    pub async fn resolve(&self, identity: &IdentityHandle) -> ProfileOutcome {
        match self.guard.run(self.source.get_profile(identity)).await {
            Ok(profile) => {
                info!(%identity, "profile resolved");
                ProfileOutcome::Live(profile)
            }
            Err(err) if err.is_timeout() => {
                warn!(%identity, error = %err, "profile timed out, using fallback profile");
                ProfileOutcome::Degraded(fallback_profile(
                    &self.default_identity,
                    &self.default_region,
                ))
            }
            Err(err) => {
                warn!(%identity, error = %err, "profile lookup failed");
                ProfileOutcome::Failed(err)
            }
        }
    }
}
