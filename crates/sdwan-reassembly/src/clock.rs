//! Monotonic time source for buffer ages and dwell times.
//!
//! `Packet.timestamp` is expressed in milliseconds since the clock's origin.
//! Clones share the origin and the underlying `quanta::Clock`, so every stage
//! of one pipeline agrees on what "now" is.

use std::sync::Arc;

use quanta::{Clock, Instant, Mock};

#[derive(Debug, Clone)]
pub struct MonotonicClock {
    clock: Clock,
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::from_clock(Clock::new())
    }

    /// A clock that only moves when the returned handle is advanced.
    pub fn mock() -> (Self, Arc<Mock>) {
        let (clock, mock) = Clock::mock();
        (Self::from_clock(clock), mock)
    }

    fn from_clock(clock: Clock) -> Self {
        let origin = clock.now();
        MonotonicClock { clock, origin }
    }

    #[inline]
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Milliseconds elapsed since the origin.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.as_ms(self.now())
    }

    /// `instant` expressed on the millisecond timebase.
    pub fn as_ms(&self, instant: Instant) -> u64 {
        instant.saturating_duration_since(self.origin).as_millis() as u64
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}
