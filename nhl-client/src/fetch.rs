//! Fetch outcomes and the retry policy applied to every GET.

use crate::error::FetchError;
use reqwest::StatusCode;
use std::time::Duration;

/// Statuses worth another attempt.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

const DEFAULT_MAX_RETRIES: u32 = 10;
const DEFAULT_BACKOFF_FACTOR: Duration = Duration::from_millis(100);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Result of a single logical fetch, after retries.
///
/// Callers that only care about "data or nothing" use [`Fetched::into_data`];
/// callers that want their own retry policy can match on the failure kind.
#[derive(Debug)]
pub enum Fetched<T> {
    /// A successful response with a decoded body.
    Data(T),
    /// A successful response with nothing in it.
    NoData,
    /// Timeout, connection failure, or a retryable status that ran out of retries.
    Transient(FetchError),
    /// Non-retryable status, undecodable body, or another request failure.
    Permanent(FetchError),
}

impl<T> Fetched<T> {
    pub fn is_data(&self) -> bool {
        matches!(self, Fetched::Data(_))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Fetched::Transient(_))
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, Fetched::Permanent(_))
    }

    /// The failure, if this fetch failed.
    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Fetched::Transient(e) | Fetched::Permanent(e) => Some(e),
            Fetched::Data(_) | Fetched::NoData => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Data(v) => Fetched::Data(f(v)),
            Fetched::NoData => Fetched::NoData,
            Fetched::Transient(e) => Fetched::Transient(e),
            Fetched::Permanent(e) => Fetched::Permanent(e),
        }
    }

    /// Collapse to "data or nothing", logging failures.
    pub fn into_data(self) -> Option<T> {
        match self {
            Fetched::Data(v) => Some(v),
            Fetched::NoData => None,
            Fetched::Transient(e) => {
                tracing::warn!(url = e.url(), error = %e, "transient fetch failure, treating as no data");
                None
            }
            Fetched::Permanent(e) => {
                tracing::warn!(url = e.url(), error = %e, "fetch failed, treating as no data");
                None
            }
        }
    }
}

/// Retry, backoff and timeout settings for the stats API.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable(&self, status: StatusCode) -> bool {
        RETRYABLE_STATUSES.contains(&status.as_u16())
    }

    /// Sleep before retry number `retry` (1-based).
    ///
    /// The first retry goes out immediately; after that the delay doubles
    /// from `backoff_factor`, capped at two minutes.
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry <= 1 {
            return Duration::ZERO;
        }
        let exponent = (retry - 1).min(16);
        self.backoff_factor
            .saturating_mul(1u32 << exponent)
            .min(MAX_BACKOFF)
    }

    /// Delay requested by a `Retry-After` header, capped like the backoff.
    pub(crate) fn retry_after(&self, status: StatusCode, header: Option<&str>) -> Option<Duration> {
        if status != StatusCode::TOO_MANY_REQUESTS && status != StatusCode::SERVICE_UNAVAILABLE {
            return None;
        }
        let secs: u64 = header?.trim().parse().ok()?;
        Some(Duration::from_secs(secs).min(MAX_BACKOFF))
    }
}
