use std::time::Duration;

use config::shared::ReconnectConfig;

/// Capped exponential backoff for stream reconnect attempts.
///
/// The delay starts at the configured floor and is multiplied by the backoff
/// factor after each consecutive failure, up to the ceiling. The policy holds
/// no timers itself; the connection supervisor asks for the next delay and
/// sleeps, which keeps the policy testable without a clock.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    initial_delay: Duration,
    max_delay: Duration,
    backoff_factor: f64,
    current_delay: Duration,
}

impl ReconnectPolicy {
    /// Creates a policy from the reconnect configuration.
    pub fn new(config: &ReconnectConfig) -> Self {
        let initial_delay = Duration::from_millis(config.initial_delay_ms);

        Self {
            initial_delay,
            max_delay: Duration::from_millis(config.max_delay_ms),
            backoff_factor: config.backoff_factor,
            current_delay: initial_delay,
        }
    }

    /// Returns the delay to wait before the next reconnect attempt and grows
    /// the delay for the attempt after it.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current_delay;

        let grown = self.current_delay.mul_f64(self.backoff_factor);
        self.current_delay = grown.min(self.max_delay);

        delay
    }

    /// Resets the delay to the floor value.
    ///
    /// Called after a connection opens successfully so the next failure
    /// starts the backoff sequence from the beginning.
    pub fn reset(&mut self) {
        self.current_delay = self.initial_delay;
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(&ReconnectConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ReconnectPolicy {
        ReconnectPolicy::new(&ReconnectConfig {
            initial_delay_ms: 2_000,
            max_delay_ms: 30_000,
            backoff_factor: 1.5,
        })
    }

    #[test]
    fn delay_grows_by_factor() {
        let mut policy = policy();

        assert_eq!(policy.next_delay(), Duration::from_millis(2_000));
        assert_eq!(policy.next_delay(), Duration::from_millis(3_000));
        assert_eq!(policy.next_delay(), Duration::from_millis(4_500));
    }

    #[test]
    fn delay_is_capped_at_ceiling() {
        let mut policy = policy();

        let mut last = Duration::ZERO;
        for _ in 0..20 {
            last = policy.next_delay();
        }

        assert_eq!(last, Duration::from_millis(30_000));
    }

    #[test]
    fn reset_returns_to_floor() {
        let mut policy = policy();

        policy.next_delay();
        policy.next_delay();
        policy.reset();

        assert_eq!(policy.next_delay(), Duration::from_millis(2_000));
    }
}
