// ABOUTME: Exponential backoff and the supervised retry loop that keeps the listener alive.
// ABOUTME: Failed attempts are logged and retried until the operation ends cleanly or is cancelled.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;

pub const FIRST_RETRY: Duration = Duration::from_secs(2);
pub const MIN_INTERVAL: Duration = Duration::from_secs(10);
pub const MAX_INTERVAL: Duration = Duration::from_secs(60);

/// Delay schedule between attempts: `first`, then `min` doubling up to `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    first: Duration,
    min: Duration,
    max: Duration,
    failures: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(FIRST_RETRY, MIN_INTERVAL, MAX_INTERVAL)
    }
}

impl Backoff {
    pub fn new(first: Duration, min: Duration, max: Duration) -> Self {
        Self {
            first,
            min,
            max,
            failures: 0,
        }
    }

    /// Record a failure and return how long to wait before the next attempt.
    pub fn next_delay(&mut self) -> Duration {
        let delay = match self.failures {
            0 => self.first,
            n => {
                let factor = 2u32.saturating_pow(n - 1);
                self.min.saturating_mul(factor).min(self.max)
            }
        };
        self.failures = self.failures.saturating_add(1);
        delay
    }
}

/// Run `op` until it returns `Ok`, or until `cancel` flips to true.
///
/// `op` receives the 1-based attempt number. An `Err` is logged and retried
/// after the next backoff delay; a cancel during that wait ends the loop
/// without another attempt. Returns the number of attempts made.
pub async fn retry_until_stopped<F, Fut, E>(
    mut backoff: Backoff,
    mut cancel: watch::Receiver<bool>,
    mut op: F,
) -> u32
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    let mut attempts = 0;
    loop {
        if *cancel.borrow() {
            return attempts;
        }
        attempts += 1;

        match op(attempts).await {
            Ok(()) => return attempts,
            Err(e) => {
                let delay = backoff.next_delay();
                tracing::warn!(
                    "attempt {} failed: {}; retrying in {}s",
                    attempts,
                    e,
                    delay.as_secs()
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.wait_for(|stop| *stop) => {
                        tracing::debug!("retry loop cancelled after {} attempts", attempts);
                        return attempts;
                    }
                }
            }
        }
    }
}
