//! Reconnect timing and the silence watchdog.

use std::time::{Duration, Instant};

/// When to reconnect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay after an error or a closed stream. Default: 3 s.
    pub retry: Duration,
    /// Silence after which a connected stream is treated as dead. Default: 20 s.
    pub silence: Duration,
    /// How often silence is checked. Default: 5 s.
    pub watchdog_poll: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            retry: Duration::from_secs(3),
            silence: Duration::from_secs(20),
            watchdog_poll: Duration::from_secs(5),
        }
    }
}

/// Tracks the last sign of life on a stream.
#[derive(Clone, Copy, Debug)]
pub struct Watchdog {
    last_event: Instant,
    silence: Duration,
}

impl Watchdog {
    /// A watchdog that last heard from the stream at `now`.
    pub fn new(silence: Duration, now: Instant) -> Self {
        Self {
            last_event: now,
            silence,
        }
    }

    /// An event arrived at `now`.
    pub fn record(&mut self, now: Instant) {
        self.last_event = now;
    }

    /// Whether the stream has been silent longer than allowed.
    pub fn is_stale(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_event) > self.silence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_only_after_threshold() {
        let start = Instant::now();
        let mut w = Watchdog::new(Duration::from_secs(20), start);
        assert!(!w.is_stale(start + Duration::from_secs(20)));
        assert!(w.is_stale(start + Duration::from_secs(21)));
        w.record(start + Duration::from_secs(21));
        assert!(!w.is_stale(start + Duration::from_secs(30)));
    }

    #[test]
    fn default_policy() {
        let p = ReconnectPolicy::default();
        assert_eq!(p.retry, Duration::from_secs(3));
        assert_eq!(p.silence, Duration::from_secs(20));
        assert_eq!(p.watchdog_poll, Duration::from_secs(5));
    }
}
