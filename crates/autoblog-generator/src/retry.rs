//! Exponential-backoff retry for transient upstream failures.

use std::future::Future;
use std::time::Duration;

use autoblog_core::error::Result;

/// Run `op` up to `1 + max_retries` times, sleeping `base_delay` before the
/// first retry and doubling it each attempt. Only transient errors are
/// retried; hard errors (and exhausted retries) surface to the caller.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    base_delay: Duration,
    op: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = base_delay;
    let mut remaining = max_retries;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && remaining > 0 => {
                tracing::warn!(
                    "API busy/overloaded, retrying in {}ms ({} attempts left): {e}",
                    delay.as_millis(),
                    remaining
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                remaining -= 1;
            }
            Err(e) => return Err(e),
        }
    }
}
