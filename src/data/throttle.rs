//! Pauses between outbound requests.

use std::time::Duration;

use rand::Rng;

/// Fixed pause plus optional random jitter, applied between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    base: Duration,
    jitter: Duration,
}

impl Throttle {
    pub fn none() -> Self {
        Self::fixed(Duration::ZERO)
    }

    pub fn fixed(base: Duration) -> Self {
        Self {
            base,
            jitter: Duration::ZERO,
        }
    }

    pub fn jittered(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    /// Delay for the next pause: `base + U(0, jitter)`.
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return self.base;
        }
        let extra = rand::thread_rng().gen_range(0..=jitter_ms);
        self.base + Duration::from_millis(extra)
    }

    pub fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}
