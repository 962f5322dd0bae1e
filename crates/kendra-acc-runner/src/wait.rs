//! Polling with exponential backoff, a deadline and optional cancellation
//!
//! Used where the runner has to observe an asynchronous AWS transition,
//! such as an index leaving the `DELETING` state.

use anyhow::{Result, bail};
use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Backoff bounds and overall deadline for one wait
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// First delay; doubles (with jitter) after each unmet check
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Total budget, measured from the first check
    pub timeout: Duration,
}

impl WaitConfig {
    /// Index deletion takes minutes; poll slowly up to `timeout`.
    pub fn for_index_deletion(timeout: Duration) -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(30),
            timeout,
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_factor(2.0)
            .with_jitter()
            .without_max_times()
            .build()
    }
}

/// Resolves when `cancel` fires; never resolves without a token.
async fn cancelled(cancel: Option<&CancellationToken>) {
    match cancel {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

/// Poll `check` until it returns `Ok(true)`.
///
/// The check always runs at least once. Sleeps never overshoot the deadline,
/// and a cancelled token interrupts a sleep immediately.
pub async fn wait_for_resource<F, Fut>(
    config: WaitConfig,
    cancel: Option<&CancellationToken>,
    check: F,
    what: &str,
) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + config.timeout;
    let mut delays = config.backoff();
    let mut attempts = 0u32;

    loop {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            bail!("Wait for {what} cancelled");
        }

        attempts += 1;
        let done = check().await.inspect_err(|e| {
            warn!(what = %what, attempt = attempts, error = %e, "Poll check failed");
        })?;
        if done {
            debug!(what = %what, attempts, "Condition met");
            return Ok(());
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            bail!(
                "Timeout waiting for {what} after {:?} ({attempts} attempts)",
                config.timeout
            );
        }

        let delay = delays.next().unwrap_or(config.max_delay).min(remaining);
        debug!(what = %what, attempt = attempts, delay_ms = delay.as_millis(), "Polling again");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancelled(cancel) => bail!("Wait for {what} cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> WaitConfig {
        WaitConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn returns_once_condition_holds() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        wait_for_resource(
            fast(),
            None,
            || async move { Ok(calls.fetch_add(1, Ordering::SeqCst) >= 2) },
            "test",
        )
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn times_out() {
        let config = WaitConfig {
            timeout: Duration::from_millis(20),
            ..fast()
        };
        let err = wait_for_resource(config, None, || async { Ok(false) }, "never")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Timeout waiting for never"));
    }

    #[tokio::test]
    async fn check_errors_propagate() {
        let err = wait_for_resource(
            fast(),
            None,
            || async { Err(anyhow::anyhow!("describe failed")) },
            "broken",
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "describe failed");
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_never_overshoots_deadline() {
        let config = WaitConfig {
            initial_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(60),
            timeout: Duration::from_secs(1),
        };
        let start = Instant::now();
        let err = wait_for_resource(config, None, || async { Ok(false) }, "slow")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("(2 attempts)"), "{err}");
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_sleep() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let config = WaitConfig::for_index_deletion(Duration::from_secs(600));
        let start = Instant::now();
        let err = wait_for_resource(config, Some(&token), || async { Ok(false) }, "deletion")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Wait for deletion cancelled");
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn cancellation_stops_waiting() {
        let token = CancellationToken::new();
        token.cancel();
        let err = wait_for_resource(fast(), Some(&token), || async { Ok(false) }, "cancelled")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cancelled"));
    }
}
