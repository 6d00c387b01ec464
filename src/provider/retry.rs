// src/provider/retry.rs — Bounded retry-with-backoff for backend readiness
//
// Probes a backend until it answers, with exponential backoff and a hard cap
// on attempts. Gives up with an explicit error instead of polling forever.

use std::time::Duration;

use super::ollama::OllamaBackend;
use crate::infra::errors::PromptTuneError;

const MAX_ATTEMPTS: u32 = 10;
const INITIAL_DELAY_MS: u64 = 500;
const BACKOFF_FACTOR: f64 = 2.0;
const MAX_DELAY_MS: u64 = 10_000;
const JITTER_FRACTION: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
    pub jitter_fraction: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(INITIAL_DELAY_MS),
            backoff_factor: BACKOFF_FACTOR,
            max_delay: Duration::from_millis(MAX_DELAY_MS),
            jitter_fraction: JITTER_FRACTION,
        }
    }
}

impl RetryConfig {
    /// Delay before the given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_factor.powi(attempt as i32);
        let capped_ms = base_ms.min(self.max_delay.as_millis() as f64);
        let jitter = deterministic_jitter(attempt, self.jitter_fraction);
        Duration::from_millis((capped_ms * jitter).max(50.0) as u64)
    }
}

/// Pseudo-random but reproducible jitter factor in [1 - f, 1 + f].
fn deterministic_jitter(attempt: u32, fraction: f64) -> f64 {
    let hash = attempt.wrapping_mul(2654435761) % 1000;
    1.0 - fraction + (hash as f64 / 1000.0) * 2.0 * fraction
}

/// Wait until the backend answers its probe, or fail after `max_attempts`.
pub async fn wait_until_ready(
    backend: &OllamaBackend,
    config: &RetryConfig,
) -> Result<(), PromptTuneError> {
    let mut last_err = None;

    for attempt in 0..config.max_attempts {
        match backend.probe().await {
            Ok(()) => {
                if attempt > 0 {
                    tracing::info!(attempt, "Backend ready after retries");
                }
                return Ok(());
            }
            Err(e) if e.is_retriable() => {
                let delay = config.delay_for_attempt(attempt);
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Backend not ready, backing off",
                );
                last_err = Some(e);
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }

    if let Some(e) = last_err {
        tracing::warn!(error = %e, "Giving up on backend readiness");
    }
    Err(PromptTuneError::BackendUnavailable {
        url: backend.base_url().to_string(),
        attempts: config.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_grows_exponentially() {
        let config = RetryConfig {
            jitter_fraction: 0.0,
            ..RetryConfig::default()
        };
        let d0 = config.delay_for_attempt(0);
        let d1 = config.delay_for_attempt(1);
        let d2 = config.delay_for_attempt(2);
        assert_eq!(d0, Duration::from_millis(500));
        assert_eq!(d1, Duration::from_millis(1000));
        assert_eq!(d2, Duration::from_millis(2000));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let config = RetryConfig {
            jitter_fraction: 0.0,
            ..RetryConfig::default()
        };
        let d = config.delay_for_attempt(20);
        assert_eq!(d, Duration::from_millis(10_000));
    }

    #[test]
    fn test_jitter_within_bounds() {
        for attempt in 0..32 {
            let j = deterministic_jitter(attempt, 0.2);
            assert!(j >= 0.8 && j <= 1.2, "jitter {} out of bounds", j);
        }
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        // Nothing listens on this port; every probe fails as retriable.
        let backend = OllamaBackend::new(Some("http://127.0.0.1:1".into()));
        let config = RetryConfig {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            ..RetryConfig::default()
        };
        let result = wait_until_ready(&backend, &config).await;
        match result {
            Err(PromptTuneError::BackendUnavailable { attempts, .. }) => {
                assert_eq!(attempts, 2);
            }
            other => panic!("expected BackendUnavailable, got {:?}", other.err()),
        }
    }
}
