//! Reconnection policy for the messaging channel.
//!
//! This module contains pure functions that decide whether and when the
//! session retries a lost connection, without side effects, making them easy
//! to test.

use std::time::Duration;

/// Default delay between reconnection attempts
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);

/// Delay strategy between reconnection attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every attempt
    Fixed(Duration),
    /// Delay doubles with each attempt, starting at `initial`, capped at `max`
    Exponential { initial: Duration, max: Duration },
}

/// When and how often to retry a lost connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub backoff: Backoff,
    /// `None` retries indefinitely
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_DELAY)
    }
}

impl ReconnectPolicy {
    /// Retry indefinitely with a fixed delay
    pub fn fixed(delay: Duration) -> Self {
        Self {
            backoff: Backoff::Fixed(delay),
            max_attempts: None,
        }
    }

    /// Retry indefinitely with an exponentially growing delay
    pub fn exponential(initial: Duration, max: Duration) -> Self {
        Self {
            backoff: Backoff::Exponential { initial, max },
            max_attempts: None,
        }
    }

    /// Give up after `max_attempts` consecutive failed attempts
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Check if the session should attempt to reconnect.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The upcoming attempt number (1 for the first retry)
    ///
    /// # Returns
    ///
    /// `true` if reconnection should be attempted, `false` otherwise
    pub fn should_attempt_reconnect(&self, attempt: u32) -> bool {
        match self.max_attempts {
            Some(max_attempts) => attempt <= max_attempts,
            None => true,
        }
    }

    /// Delay to wait before the given attempt (1 for the first retry)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, max } => {
                let exponent = attempt.saturating_sub(1).min(31);
                initial
                    .checked_mul(1u32 << exponent)
                    .map_or(max, |delay| delay.min(max))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_fixed_five_seconds() {
        // テスト項目: デフォルトのポリシーは 5 秒固定で無期限に再接続する
        // given (前提条件):
        let policy = ReconnectPolicy::default();

        // when (操作):
        let delay = policy.delay_for(1);

        // then (期待する結果):
        assert_eq!(delay, Duration::from_millis(5000));
        assert_eq!(policy.delay_for(100), Duration::from_millis(5000));
        assert!(policy.should_attempt_reconnect(u32::MAX));
    }

    #[test]
    fn test_should_attempt_reconnect_within_limit() {
        // テスト項目: 再接続回数が上限以内の場合、再接続すべきと判定される
        // given (前提条件):
        let policy = ReconnectPolicy::default().with_max_attempts(5);

        // when (操作):
        let result = policy.should_attempt_reconnect(3);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_attempt_reconnect_at_limit() {
        // テスト項目: 上限ちょうどの試行は許可され、それを超えると拒否される
        // given (前提条件):
        let policy = ReconnectPolicy::default().with_max_attempts(5);

        // when (操作):
        let last = policy.should_attempt_reconnect(5);
        let beyond = policy.should_attempt_reconnect(6);

        // then (期待する結果):
        assert!(last);
        assert!(!beyond);
    }

    #[test]
    fn test_exponential_backoff_doubles_until_cap() {
        // テスト項目: 指数バックオフは倍々に増え、上限で頭打ちになる
        // given (前提条件):
        let policy =
            ReconnectPolicy::exponential(Duration::from_millis(500), Duration::from_secs(3));

        // when (操作):
        let delays: Vec<Duration> = (1..=5).map(|attempt| policy.delay_for(attempt)).collect();

        // then (期待する結果):
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(500),
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_secs(3),
                Duration::from_secs(3),
            ]
        );
    }

    #[test]
    fn test_exponential_backoff_does_not_overflow() {
        // テスト項目: 非常に大きな試行回数でもオーバーフローせず上限を返す
        // given (前提条件):
        let policy = ReconnectPolicy::exponential(Duration::from_secs(10), Duration::from_secs(60));

        // when (操作):
        let delay = policy.delay_for(u32::MAX);

        // then (期待する結果):
        assert_eq!(delay, Duration::from_secs(60));
    }
}
