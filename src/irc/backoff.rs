//! Reconnect delays.

use std::time::Duration;

/// Exponential backoff: `initial`, doubled after every failed attempt, up
/// to `max`.
#[derive(Debug, Clone)]
pub(super) struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
            current: initial,
        }
    }

    /// The delay to wait now. The one after it is doubled.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    /// Start over after a successful login.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn secs(secs: u64) -> Duration {
        Duration::from_secs(secs)
    }

    #[test]
    fn doubles_up_to_the_cap() {
        let mut backoff = Backoff::new(secs(5), secs(30));
        let delays: Vec<_> = (0..6).map(|_| backoff.next_delay()).collect();

        assert_eq!(delays, vec![secs(5), secs(10), secs(20), secs(30), secs(30), secs(30)]);
    }

    #[test]
    fn reset_starts_over() {
        let mut backoff = Backoff::new(secs(5), secs(300));
        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(backoff.next_delay(), secs(20));

        backoff.reset();
        assert_eq!(backoff.next_delay(), secs(5));
    }

    #[test]
    fn cap_below_initial_delay() {
        let mut backoff = Backoff::new(secs(10), secs(1));
        assert_eq!(backoff.next_delay(), secs(10));
        assert_eq!(backoff.next_delay(), secs(10));
    }
}
