use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::FetchError;

/// Runs `operation`, failing with [`FetchError::Timeout`] if it has not
/// resolved within `deadline`. Exactly one of the two outcomes is produced.
pub async fn guard<T, F>(operation: F, deadline: Duration) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => {
            debug!(deadline_ms = deadline.as_millis() as u64, "request abandoned at deadline");
            Err(FetchError::Timeout(deadline))
        }
    }
}

/// A fixed deadline that can be handed to components and reused per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutGuard {
    deadline: Duration,
}

impl TimeoutGuard {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub async fn run<T, F>(&self, operation: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        guard(operation, self.deadline).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::time::{Instant, sleep};

    #[tokio::test(start_paused = true)]
    async fn fast_operation_wins() {
        let out = guard(
            async {
                sleep(Duration::from_millis(10)).await;
                Ok::<_, FetchError>(7)
            },
            Duration::from_millis(100),
        )
        .await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_operation_times_out_before_it_resolves() {
        let resolved = Arc::new(AtomicBool::new(false));
        let flag = resolved.clone();
        let deadline = Duration::from_millis(100);
        let started = Instant::now();

        let out = guard(
            async move {
                sleep(deadline + Duration::from_millis(50)).await;
                flag.store(true, Ordering::SeqCst);
                Ok::<_, FetchError>(())
            },
            deadline,
        )
        .await;

        assert_eq!(out, Err(FetchError::Timeout(deadline)));
        let waited = started.elapsed();
        assert!(waited >= deadline && waited < deadline + Duration::from_millis(50));
        assert!(!resolved.load(Ordering::SeqCst));

        // The abandoned operation never gets to run its tail.
        sleep(Duration::from_secs(1)).await;
        assert!(!resolved.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn operation_errors_pass_through() {
        let guard = TimeoutGuard::new(Duration::from_secs(1));
        let out: Result<(), _> = guard
            .run(async { Err(FetchError::NotFound("nobody".to_string())) })
            .await;
        assert_eq!(out, Err(FetchError::NotFound("nobody".to_string())));
        assert_eq!(guard.deadline(), Duration::from_secs(1));
    }
}
