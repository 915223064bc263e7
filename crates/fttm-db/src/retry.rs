//! Retry with exponential back-off and jitter for store calls.
//!
//! [`retry_with_backoff`] wraps a fallible database operation and retries on
//! transient failures (dropped connections, pool exhaustion, serialization
//! conflicts). Constraint violations and malformed batches are returned
//! immediately since retrying cannot change their outcome.

use std::future::Future;
use std::time::Duration;

use crate::DbError;

const MAX_DELAY_MS: u64 = 60_000;

/// How many extra attempts a store call gets and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 250,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_app_config(config: &fttm_core::AppConfig) -> Self {
        Self {
            max_retries: config.store_max_retries,
            backoff_base_ms: config.store_retry_backoff_base_ms,
        }
    }

    /// No retries at all.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
        }
    }
}

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - I/O failures and pool acquire timeouts.
/// - SQLSTATE class `08` (connection exception), `40001` serialization
///   failure, and `40P01` deadlock.
///
/// **Not retriable:** everything else, including constraint violations,
/// decode errors, and [`DbError::InvalidBatch`].
pub(crate) fn is_retriable(err: &DbError) -> bool {
    match err {
        DbError::Sqlx(sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut) => true,
        DbError::Sqlx(sqlx::Error::Database(db)) => db
            .code()
            .is_some_and(|code| code.starts_with("08") || code == "40001" || code == "40P01"),
        DbError::Sqlx(_) | DbError::InvalidBatch(_) => false,
    }
}

/// Runs `operation` with up to `policy.max_retries` additional attempts on
/// transient errors.
///
/// Back-off schedule with `backoff_base_ms = 250`:
///
/// | Attempt | Sleep before next attempt   |
/// |---------|-----------------------------|
/// | 1       | 250 ms × 2⁰ ± 25 % jitter   |
/// | 2       | 250 ms × 2¹ ± 25 % jitter   |
/// | 3       | 250 ms × 2² ± 25 % jitter   |
///
/// Delay is capped at 60 s. Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    operation_name: &'static str,
    mut operation: F,
) -> Result<T, DbError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = policy
                    .backoff_base_ms
                    .saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms,
                    error = %err,
                    "transient store error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
