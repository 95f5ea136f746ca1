//! Bounded exponential backoff for transient failures.
//!
//! Two callers: the dispatcher retries engine calls that hit a busy store,
//! and the notification worker retries Telegram sends. Anything that is not
//! [`Retryable`] fails on the first attempt.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

/// Implemented by errors that can tell a transient failure from a final one.
pub trait Retryable {
    fn is_retryable(&self) -> bool;

    /// Server-supplied wait, overrides the computed backoff.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl Retryable for teloxide::RequestError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            teloxide::RequestError::Network(_) | teloxide::RequestError::RetryAfter(_)
        )
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            teloxide::RequestError::RetryAfter(seconds) => Some(seconds.duration()),
            _ => None,
        }
    }
}

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Up to +25% random delay
    pub jitter: bool,
}

impl RetryConfig {
    /// Busy or exhausted store: two quick retries, well under a chat round-trip.
    pub fn store() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            jitter: true,
        }
    }

    /// Telegram delivery: more patience, the user is not waiting on it.
    pub fn network() -> Self {
        Self {
            max_retries: 4,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            jitter: true,
        }
    }

    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    #[must_use]
    pub fn no_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Wait before retry number `retry` (zero-based): doubles each time, capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        let delay = self.initial_delay.saturating_mul(factor).min(self.max_delay);
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let extra = rand::rng().random_range(0.0..0.25);
        delay.mul_f64(1.0 + extra)
    }
}

/// Runs `operation` until it succeeds, fails for good, or runs out of retries.
/// Returns the last error in the latter cases.
pub async fn retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let mut retries = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && retries < config.max_retries => {
                let delay = e.retry_after().unwrap_or_else(|| config.delay_for(retries));
                retries += 1;
                log::warn!(
                    "Transient failure ({}), retry {}/{} in {:?}",
                    e,
                    retries,
                    config.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if retries > 0 {
                    log::warn!("Giving up after {} retries: {}", retries, e);
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Flaky {
        transient: bool,
    }

    impl std::fmt::Display for Flaky {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "flaky (transient: {})", self.transient)
        }
    }

    impl Retryable for Flaky {
        fn is_retryable(&self) -> bool {
            self.transient
        }
    }

    fn fast() -> RetryConfig {
        RetryConfig::store().initial_delay(Duration::from_millis(1)).no_jitter()
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let calls = &AtomicU32::new(0);
        let result = retry(&fast(), move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Flaky { transient: true })
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = retry(&fast().max_retries(1), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Flaky { transient: true })
        })
        .await;

        assert!(result.unwrap_err().transient);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_final_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = retry(&fast(), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Flaky { transient: false })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_doubles_up_to_cap() {
        let config = RetryConfig::store().no_jitter();
        assert_eq!(config.delay_for(0), Duration::from_millis(200));
        assert_eq!(config.delay_for(1), Duration::from_millis(400));
        assert_eq!(config.delay_for(3), Duration::from_millis(1600));
        assert_eq!(config.delay_for(4), Duration::from_secs(2));
        assert_eq!(config.delay_for(40), Duration::from_secs(2));
    }

    #[test]
    fn test_jitter_stays_within_a_quarter() {
        let config = RetryConfig::network();
        for n in 0..5 {
            let base = config.clone().no_jitter().delay_for(n);
            let jittered = config.delay_for(n);
            assert!(jittered >= base && jittered <= base.mul_f64(1.25));
        }
    }
}
