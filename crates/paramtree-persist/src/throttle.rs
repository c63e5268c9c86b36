//! Leading-edge write throttle with a trailing flag
//!
//! ```text
//! change @0ms   → write (window opens)
//! change @30ms  → dirty
//! change @60ms  → dirty
//! change @120ms → write (window reopens, dirty cleared)
//! ```
//!
//! A dirty throttle is flushed by the owner (explicit flush or detach), so
//! the last change in a burst is never lost.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_write: Option<Instant>,
    dirty: bool,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_write: None,
            dirty: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Record a change at `now`; returns true if the caller should write now
    pub fn on_change(&mut self, now: Instant) -> bool {
        match self.last_write {
            Some(last) if now.saturating_duration_since(last) < self.interval => {
                self.dirty = true;
                false
            }
            _ => {
                self.mark_written(now);
                true
            }
        }
    }

    /// Record a write performed at `now`
    pub fn mark_written(&mut self, now: Instant) {
        self.last_write = Some(now);
        self.dirty = false;
    }

    /// True if a change arrived inside the window and has not been written
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_burst_writes_once_then_marks_dirty() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(ms(100));
        assert!(throttle.on_change(t0));
        assert!(!throttle.is_dirty());
        assert!(!throttle.on_change(t0 + ms(30)));
        assert!(!throttle.on_change(t0 + ms(60)));
        assert!(throttle.is_dirty());

        // First change after the window writes and clears the flag
        assert!(throttle.on_change(t0 + ms(120)));
        assert!(!throttle.is_dirty());
    }

    #[test]
    fn test_zero_interval_always_writes() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(Duration::ZERO);
        assert!(throttle.on_change(t0));
        assert!(throttle.on_change(t0));
        assert!(!throttle.is_dirty());
    }

    #[test]
    fn test_flush_clears_dirty() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(ms(100));
        throttle.on_change(t0);
        throttle.on_change(t0 + ms(10));
        throttle.mark_written(t0 + ms(20));
        assert!(!throttle.is_dirty());
        // The flush reopened the window
        assert!(!throttle.on_change(t0 + ms(50)));
    }
}
