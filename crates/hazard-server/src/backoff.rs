//! Retry schedule for the alert feed.
//!
//! The wait doubles with each consecutive failure up to a ceiling. When the
//! feed sends `Retry-After` and asks for longer than the schedule, its hint
//! wins (still bounded by the ceiling).

use std::time::{Duration, Instant};

/// Doubling stops after this many steps; the ceiling applies well before.
const MAX_DOUBLINGS: u32 = 16;

#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    ceiling: Duration,
    failures: u32,
    resume_at: Option<Instant>,
}

impl Backoff {
    pub fn new(base: Duration, ceiling: Duration) -> Self {
        Self {
            base,
            ceiling: ceiling.max(base),
            failures: 0,
            resume_at: None,
        }
    }

    /// Whether a fetch may go out at `now`.
    pub fn ready(&self, now: Instant) -> bool {
        self.resume_at.map_or(true, |at| now >= at)
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn succeeded(&mut self) {
        self.failures = 0;
        self.resume_at = None;
    }

    /// Record a failed fetch at `now` and return the hold-off applied.
    pub fn failed(&mut self, now: Instant, retry_after: Option<Duration>) -> Duration {
        self.failures = self.failures.saturating_add(1);
        let scheduled = self.delay_for(self.failures);
        let delay = match retry_after {
            Some(hint) => hint.min(self.ceiling).max(scheduled),
            None => scheduled,
        };
        self.resume_at = Some(now + delay);
        delay
    }

    /// Scheduled wait after `failures` consecutive failures.
    pub fn delay_for(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let doublings = (failures - 1).min(MAX_DOUBLINGS);
        self.base.saturating_mul(1 << doublings).min(self.ceiling)
    }
}
