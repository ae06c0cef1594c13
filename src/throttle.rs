use std::time::Duration;

use tokio::time::Instant;

/// Minimum wall-clock gap between two real gateway calls.
///
/// The gate only looks at elapsed time since the last recorded call; it knows
/// nothing about whether the data changed.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_call: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_call(&self) -> Option<Instant> {
        self.last_call
    }

    /// Whether a call made at `now` may go out to the network.
    pub fn ready(&self, now: Instant) -> bool {
        match self.last_call {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    pub fn mark(&mut self, now: Instant) {
        self.last_call = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_is_always_ready() {
        let throttle = Throttle::new(Duration::from_secs(30));
        assert!(throttle.ready(Instant::now()));
        assert!(throttle.last_call().is_none());
    }

    #[test]
    fn blocks_inside_window() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_secs(30));
        throttle.mark(start);

        assert!(!throttle.ready(start));
        assert!(!throttle.ready(start + Duration::from_secs(29)));
    }

    #[test]
    fn opens_once_interval_elapsed() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_secs(30));
        throttle.mark(start);

        assert!(throttle.ready(start + Duration::from_secs(30)));
        assert!(throttle.ready(start + Duration::from_secs(31)));
    }

    #[test]
    fn window_restarts_from_latest_mark() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_secs(30));
        throttle.mark(start);
        throttle.mark(start + Duration::from_secs(40));

        assert!(!throttle.ready(start + Duration::from_secs(50)));
        assert!(throttle.ready(start + Duration::from_secs(70)));
    }

    #[test]
    fn zero_interval_never_blocks() {
        let now = Instant::now();
        let mut throttle = Throttle::new(Duration::ZERO);
        throttle.mark(now);
        assert!(throttle.ready(now));
    }
}
