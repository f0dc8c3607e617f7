//! Time collaborators.
//!
//! The generator needs two readings: a coarse millisecond counter for the
//! auto-save schedule and a fine microsecond counter whose low bits perturb
//! the jitter word on every rekey. Both come through the [`Clock`] trait so
//! that tests (and deterministic replay) can supply a fixed timebase.

use std::cell::Cell;
use std::time::Instant;

/// Free-running monotonic timebase. Values wrap at `u32::MAX`, matching the
/// millisecond/microsecond counters of the constrained targets this
/// generator is modeled on; callers compare readings with wrapping
/// subtraction.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch.
    fn millis(&self) -> u32;

    /// Microseconds since an arbitrary epoch.
    fn micros(&self) -> u32;
}

/// Wall-clock implementation backed by [`Instant`].
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn millis(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }

    fn micros(&self) -> u32 {
        self.start.elapsed().as_micros() as u32
    }
}

/// Hand-advanced clock for tests and deterministic replay.
///
/// With a `ManualClock` that is never advanced, the generator is a pure
/// function of its initializer, persisted seed, and call sequence.
pub struct ManualClock {
    now_us: Cell<u64>,
}

impl ManualClock {
    /// A clock frozen at zero.
    pub fn new() -> Self {
        Self {
            now_us: Cell::new(0),
        }
    }

    /// Advance the clock by the given number of milliseconds.
    pub fn advance_millis(&self, ms: u64) {
        self.now_us.set(self.now_us.get() + ms * 1_000);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn millis(&self) -> u32 {
        (self.now_us.get() / 1_000) as u32
    }

    fn micros(&self) -> u32 {
        self.now_us.get() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.micros();
        let b = clock.micros();
        assert!(b >= a);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new();
        assert_eq!(clock.millis(), 0);
        assert_eq!(clock.micros(), 0);
        clock.advance_millis(1_500);
        assert_eq!(clock.millis(), 1_500);
        assert_eq!(clock.micros(), 1_500_000);
    }
}
