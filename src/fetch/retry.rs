//! Backoff configuration for resubmission attempts.

use std::time::Duration;

use crate::config::{RETRY_BASE_DELAY_MS, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_MS};

/// Retry settings for one resubmission.
///
/// Attempt `k` (1-based) that fails with a retryable error is followed by a
/// wait of `min(base_delay * 2^(k-1), max_delay)`. No jitter is applied here;
/// the scheduler's randomized tick interval spreads load across items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, initial attempt included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
            max_delay: Duration::from_millis(RETRY_MAX_DELAY_MS),
        }
    }
}

impl RetryConfig {
    /// Delay after failed attempt `attempt` (1-based). Saturates at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        2u32.checked_pow(exponent)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// The waits between attempts: `max_attempts - 1` delays.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..self.max_attempts.max(1)).map(move |attempt| self.delay_for_attempt(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_ms: u64, max_ms: u64, attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts: attempts,
            base_delay: Duration::from_millis(base_ms),
            max_delay: Duration::from_millis(max_ms),
        }
    }

    #[test]
    fn test_delay_sequence_matches_formula() {
        let cfg = config(100, 1_000, 8);
        for k in 1..=8u32 {
            let expected = Duration::from_millis((100u64 * 2u64.pow(k - 1)).min(1_000));
            assert_eq!(cfg.delay_for_attempt(k), expected, "attempt {k}");
        }
    }

    #[test]
    fn test_default_delays() {
        let cfg = RetryConfig::default();
        let delays: Vec<Duration> = cfg.delays().collect();
        assert_eq!(
            delays,
            vec![Duration::from_secs(1), Duration::from_secs(2)],
            "3 attempts means 2 waits"
        );
    }

    #[test]
    fn test_large_attempt_saturates() {
        let cfg = config(1_000, 30_000, 3);
        assert_eq!(cfg.delay_for_attempt(40), Duration::from_secs(30));
        assert_eq!(cfg.delay_for_attempt(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn test_single_attempt_has_no_delays() {
        assert_eq!(config(100, 1_000, 1).delays().count(), 0);
        assert_eq!(config(100, 1_000, 0).delays().count(), 0);
    }
}
