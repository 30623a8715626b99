//! Nullable clock with deterministic time for testing.

use inverse_types::{Clock, Timestamp};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to.
#[derive(Debug, Default)]
pub struct NullClock {
    current_ms: AtomicU64,
}

impl NullClock {
    pub fn new(initial_ms: u64) -> Self {
        Self {
            current_ms: AtomicU64::new(initial_ms),
        }
    }

    pub fn from_secs(initial_secs: u64) -> Self {
        Self::new(initial_secs * 1000)
    }

    /// Advance time.
    pub fn advance(&self, by: Duration) {
        self.current_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    /// Set the time to a specific value in milliseconds.
    pub fn set(&self, ms: u64) {
        self.current_ms.store(ms, Ordering::SeqCst);
    }
}

impl Clock for NullClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.current_ms.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_only_when_told() {
        let clock = NullClock::from_secs(10);
        assert_eq!(clock.now().as_secs(), 10);
        clock.advance(Duration::from_millis(1500));
        assert_eq!(clock.now().as_millis(), 11_500);
        clock.set(0);
        assert_eq!(clock.now().as_millis(), 0);
    }
}
