use std::time::Duration;

use thiserror::Error;

/// Failure of a single request against one of the upstream services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request did not complete before its deadline
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The upstream service has no record for the requested key
    #[error("not found: {0}")]
    NotFound(String),

    /// The upstream service is reachable but refused or failed the request
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The response arrived but could not be decoded into the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout(_))
    }
}

/// Statistics input that violates the non-negative / positive preconditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("negative {field}: {value}")]
    NegativeCount { field: &'static str, value: i64 },

    #[error("match duration must be positive")]
    NonPositiveDuration,

    #[error("invalid kda {0:?}, expected kills/deaths/assists")]
    KdaFormat(String),
}

impl From<ValidationError> for FetchError {
    fn from(err: ValidationError) -> Self {
        FetchError::Malformed(err.to_string())
    }
}
