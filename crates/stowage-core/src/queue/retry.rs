//! Retry policy: decides backoff delays and when a job is dead-lettered.

use std::time::Duration;

/// Upper bound for a single backoff delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60 * 60);

/// Retry policy for failed jobs.
///
/// Every failure kind is retried until `max_attempts`; a job that keeps
/// failing (including repeated `NotFound`) ends up dead.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Base delay for the first retry.
    pub base_delay: Duration,

    /// Backoff multiplier for exponential backoff.
    pub multiplier: f64,

    /// Attempts (including the first one) before the job is marked dead.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Default policy: 5 attempts, 2s base delay doubling each time.
    pub fn default_v1() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            multiplier: 2.0,
            max_attempts: 5,
        }
    }

    /// Delay before the next retry: `base_delay * multiplier^(attempts - 1)`.
    ///
    /// Example with base_delay=2s, multiplier=2.0:
    /// - attempt 1 (first failure): 2s
    /// - attempt 2: 4s
    /// - attempt 3: 8s
    ///
    /// Capped at [`MAX_RETRY_DELAY`]; a result that is not a valid duration
    /// (negative, NaN, overflow) also yields the cap.
    pub fn next_delay(&self, attempts: u32) -> Duration {
        let base_secs = self.base_delay.as_secs_f64();
        let exponent = i32::try_from(attempts.saturating_sub(1)).unwrap_or(i32::MAX);
        let delay_secs = base_secs * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(delay_secs)
            .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
    }

    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_policy_has_reasonable_values() {
        let policy = RetryPolicy::default_v1();
        assert_eq!(policy.base_delay, Duration::from_secs(2));
        assert_eq!(policy.multiplier, 2.0);
        assert_eq!(policy.max_attempts, 5);
    }

    #[rstest]
    #[case(0, 2)]
    #[case(1, 2)]
    #[case(2, 4)]
    #[case(3, 8)]
    fn exponential_backoff(#[case] attempts: u32, #[case] expected_secs: u64) {
        let policy = RetryPolicy::default_v1();
        assert_eq!(policy.next_delay(attempts), Duration::from_secs(expected_secs));
    }

    #[rstest]
    #[case::negative(-2.0)]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    fn invalid_multiplier_falls_back_to_cap(#[case] multiplier: f64) {
        let policy = RetryPolicy {
            multiplier,
            ..RetryPolicy::default_v1()
        };
        assert_eq!(policy.next_delay(2), MAX_RETRY_DELAY);
    }

    #[test]
    fn large_attempt_counts_are_capped() {
        let policy = RetryPolicy::default_v1();
        assert_eq!(policy.next_delay(200), MAX_RETRY_DELAY);
        assert_eq!(policy.next_delay(u32::MAX), MAX_RETRY_DELAY);
    }

    #[test]
    fn exhausted_at_max_attempts() {
        let policy = RetryPolicy::default_v1();
        assert!(!policy.is_exhausted(4));
        assert!(policy.is_exhausted(5));
    }
}
