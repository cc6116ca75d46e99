//! Timestamps, wake instructions, and the host clock seam
//!
//! The host's reactor owns the only real timer; everything here is about
//! telling that reactor when to call back. A step function never sleeps: it
//! returns a [`Wake`] and runs to completion.

use core::cell::Cell;

/// Monotonic host time in milliseconds
pub type Timestamp = u64;

/// Rescheduling instruction returned by every state-machine step
///
/// `Never` is the terminal sentinel: the host must disarm (and on run
/// teardown, unregister) its timer when it sees it, so no stale timer
/// survives into the next run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// Call back at the given monotonic timestamp
    At(Timestamp),
    /// Call back on the next reactor iteration
    Immediately,
    /// Do not call back; the run is over
    Never,
}

/// Source of monotonic time, provided by the host
pub trait Clock {
    /// Current monotonic timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// Adjustable clock for tests and host simulations
///
/// Interior mutability so a shared `&FixedClock` can sit in a
/// [`HostContext`](crate::host::HostContext) while the test advances it.
#[derive(Debug)]
pub struct FixedClock {
    now: Cell<Timestamp>,
}

impl FixedClock {
    /// Create a clock pinned at `now`
    pub fn new(now: Timestamp) -> Self {
        Self { now: Cell::new(now) }
    }

    /// Jump to an absolute timestamp
    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }

    /// Advance by `ms` milliseconds
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(1000);
        assert_eq!(clock.now(), 1000);

        clock.advance(500);
        assert_eq!(clock.now(), 1500);

        clock.set(100);
        assert_eq!(clock.now(), 100);
    }

    #[test]
    fn wake_is_comparable() {
        assert_eq!(Wake::At(5), Wake::At(5));
        assert_ne!(Wake::Immediately, Wake::Never);
    }
}
