//! Bounded retry for store operations
//!
//! Vote writes are optimistic: a lost conditional update or a busy SQLite
//! connection is expected under concurrent voting and is retried
//! immediately. Anything else (not found, bad input) fails on the first
//! attempt.

use songduel_common::{Error, Result};

/// Run `operation` up to `max_attempts` times while it fails with a
/// transient error.
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "like", "paired vote")
/// * `max_attempts` - Total attempts including the first; values below 1 are treated as 1
/// * `operation` - Async closure performing one full read-modify-write
///
/// # Returns
/// The first successful result, the first non-transient error, or
/// `Error::Unavailable` once attempts are exhausted.
pub async fn retry_transient<F, Fut, T>(
    operation_name: &str,
    max_attempts: u32,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        "Store operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if err.is_transient() => {
                if attempt >= max_attempts {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        error = %err,
                        "Store operation failed: retries exhausted"
                    );
                    return Err(Error::Unavailable(format!(
                        "{} failed after {} attempts: {}",
                        operation_name, attempt, err
                    )));
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    error = %err,
                    "Transient store error, retrying"
                );
            }
            Err(err) => return Err(err),
        }
    }
}
