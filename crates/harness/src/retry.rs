//! Re-running flaky scenarios with backoff

use lockcheck_config::NetworkConfig;
use lockcheck_errors::{Error, UserFacingError};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How many times, and how far apart, a flaky scenario is run
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total runs, first run included
    pub max_runs: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&NetworkConfig::default())
    }
}

impl From<&NetworkConfig> for RetryPolicy {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            max_runs: config.max_runs.max(1),
            initial_delay: Duration::from_millis(config.retry_delay_ms),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryPolicy {
    /// A policy that runs exactly once
    #[must_use]
    pub fn once() -> Self {
        Self {
            max_runs: 1,
            ..Self::default()
        }
    }

    /// Exponential backoff delay with jitter before run `attempt + 1`
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        #[allow(clippy::cast_precision_loss)]
        let base_delay = self.initial_delay.as_millis().min(u128::from(u64::MAX)) as f64;
        #[allow(clippy::cast_precision_loss)]
        let max_delay = self.max_delay.as_millis().min(u128::from(u64::MAX)) as f64;

        // Attempts are bounded by max_runs, which is small
        #[allow(clippy::cast_possible_wrap)]
        let exponent = attempt.saturating_sub(1) as i32;
        let delay = (base_delay * self.backoff_multiplier.powi(exponent)).min(max_delay);

        let jitter = delay * self.jitter_factor * (rand::random::<f64>() - 0.5);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let final_delay = (delay + jitter).max(0.0).round() as u64;

        Duration::from_millis(final_delay)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or
    /// `max_runs` is reached. Returns the last result and the number of runs.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> (Result<T, Error>, u32)
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let max_runs = self.max_runs.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return (Ok(value), attempt),
                Err(e) if attempt < max_runs && e.is_retryable() => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        scenario = label,
                        attempt,
                        max_runs,
                        error = %e,
                        "run failed, retrying in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return (Err(e), attempt),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockcheck_errors::{CheckError, ScenarioError};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_runs: u32) -> RetryPolicy {
        RetryPolicy {
            max_runs,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
        }
    }

    fn mismatch() -> Error {
        CheckError::ValueMismatch {
            location: "six.git".to_string(),
            expected: "a".to_string(),
            actual: "b".to_string(),
        }
        .into()
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy {
            max_runs: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(300));
        assert_eq!(policy.delay_for(10), Duration::from_millis(300));
    }

    #[test]
    fn test_jitter_stays_in_band() {
        let policy = RetryPolicy {
            max_runs: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter_factor: 0.5,
        };
        for _ in 0..50 {
            let delay = policy.delay_for(1).as_millis();
            assert!((750..=1250).contains(&delay), "{delay}");
        }
    }

    #[test]
    fn test_policy_from_network_config() {
        let config = NetworkConfig {
            enabled: true,
            max_runs: 4,
            retry_delay_ms: 10,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_runs, 4);
        assert_eq!(policy.initial_delay, Duration::from_millis(10));
        assert_eq!(RetryPolicy::once().max_runs, 1);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let (result, attempts) = fast(3)
            .run("flaky", move |_| async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(mismatch())
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts, 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_runs() {
        let (result, attempts) = fast(2)
            .run("flaky", |_| async { Err::<(), _>(mismatch()) })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts, 2);
    }

    #[tokio::test]
    async fn test_non_retryable_errors_stop_immediately() {
        let (result, attempts) = fast(5)
            .run("skipped", |_| async {
                Err::<(), Error>(
                    ScenarioError::Skipped {
                        reason: "no wheel".to_string(),
                    }
                    .into(),
                )
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }
}
