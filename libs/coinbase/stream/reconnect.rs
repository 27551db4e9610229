//! Reconnection strategies
//!
//! The feed reconnects with a fixed, uncapped delay by default. Backoff
//! and attempt ceilings are opt-in through `spawn_with_strategy`.

use std::time::Duration;

/// Trait for defining reconnection behavior
pub trait ReconnectionStrategy: Send + Sync {
    /// Get the delay before the next reconnection attempt
    ///
    /// # Arguments
    /// * `attempt` - The reconnection attempt number (0-indexed)
    ///
    /// # Returns
    /// * `Some(duration)` - Wait this long before reconnecting
    /// * `None` - Stop reconnecting
    fn next_delay(&self, attempt: usize) -> Option<Duration>;

    /// Check if reconnection should continue at this attempt
    fn should_reconnect(&self, attempt: usize) -> bool;
}

/// Fixed delay reconnection strategy
///
/// Always waits the same amount of time between reconnection attempts.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<usize>,
}

impl FixedDelay {
    /// Create a new fixed delay strategy
    ///
    /// # Arguments
    /// * `delay` - The fixed delay between reconnects
    /// * `max_attempts` - Maximum number of attempts (None = unlimited)
    pub fn new(delay: Duration, max_attempts: Option<usize>) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }
}

impl ReconnectionStrategy for FixedDelay {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        if !self.should_reconnect(attempt) {
            return None;
        }
        Some(self.delay)
    }

    fn should_reconnect(&self, attempt: usize) -> bool {
        self.max_attempts.map_or(true, |max| attempt < max)
    }
}

/// Exponential backoff reconnection strategy
///
/// Delays grow as initial_delay * 2^attempt, capped at max_delay.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    max_attempts: Option<usize>,
}

impl ExponentialBackoff {
    pub fn new(initial_delay: Duration, max_delay: Duration, max_attempts: Option<usize>) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_attempts,
        }
    }
}

impl ReconnectionStrategy for ExponentialBackoff {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        if !self.should_reconnect(attempt) {
            return None;
        }

        let max_millis = self.max_delay.as_millis();
        let delay = 1u128
            .checked_shl(attempt.min(128) as u32)
            .and_then(|factor| self.initial_delay.as_millis().checked_mul(factor))
            .unwrap_or(max_millis);
        Some(Duration::from_millis(delay.min(max_millis) as u64))
    }

    fn should_reconnect(&self, attempt: usize) -> bool {
        self.max_attempts.map_or(true, |max| attempt < max)
    }
}

/// Never reconnect strategy
#[derive(Debug, Clone)]
pub struct NeverReconnect;

impl ReconnectionStrategy for NeverReconnect {
    fn next_delay(&self, _attempt: usize) -> Option<Duration> {
        None
    }

    fn should_reconnect(&self, _attempt: usize) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_delay_never_varies() {
        let strategy = FixedDelay::new(Duration::from_secs(5), None);
        assert_eq!(strategy.next_delay(0), Some(Duration::from_secs(5)));
        assert_eq!(strategy.next_delay(100), Some(Duration::from_secs(5)));
    }

    #[test]
    fn fixed_delay_honors_attempt_ceiling() {
        let strategy = FixedDelay::new(Duration::from_secs(1), Some(3));
        assert!(strategy.next_delay(2).is_some());
        assert_eq!(strategy.next_delay(3), None);
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let strategy =
            ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(1), None);
        assert_eq!(strategy.next_delay(0), Some(Duration::from_millis(100)));
        assert_eq!(strategy.next_delay(1), Some(Duration::from_millis(200)));
        assert_eq!(strategy.next_delay(2), Some(Duration::from_millis(400)));
        assert_eq!(strategy.next_delay(10), Some(Duration::from_secs(1)));
        // Huge attempt numbers saturate at the cap instead of overflowing
        assert_eq!(strategy.next_delay(500), Some(Duration::from_secs(1)));
    }

    #[test]
    fn never_reconnect_always_stops() {
        assert_eq!(NeverReconnect.next_delay(0), None);
        assert!(!NeverReconnect.should_reconnect(0));
    }
}
