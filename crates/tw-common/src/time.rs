//! Monotonic time source for the cyclic executor.
//!
//! Timestamps are microseconds since the clock's own origin. The executor
//! only needs two primitives: `now()` and `spin_until(deadline)`. Waiting is
//! always a spin on the clock, never a sleep or scheduler yield.

use std::cell::Cell;
use std::fmt;
use std::ops::{Add, Sub};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Point on a monotonic microsecond timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The clock origin.
    pub const ZERO: Self = Self(0);

    /// Build a timestamp from microseconds since the clock origin.
    #[must_use]
    pub const fn from_micros(us: u64) -> Self {
        Self(us)
    }

    /// Microseconds since the clock origin.
    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, or zero if `earlier` is later.
    #[must_use]
    pub fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }

    /// Signed difference `self - other` in microseconds.
    #[must_use]
    pub fn signed_micros_since(self, other: Self) -> i64 {
        let diff = i128::from(self.0) - i128::from(other.0);
        i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX })
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(duration_micros(rhs)))
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Timestamp) -> Duration {
        self.saturating_duration_since(rhs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

/// Whole microseconds in `d`, saturating at `u64::MAX`.
#[must_use]
pub fn duration_micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

/// Monotonic microsecond clock.
pub trait MonotonicClock {
    /// Current time.
    fn now(&self) -> Timestamp;

    /// Time elapsed since `since`.
    fn elapsed_since(&self, since: Timestamp) -> Duration {
        self.now().saturating_duration_since(since)
    }

    /// Busy-wait until `deadline` is reached. Returns immediately if it has
    /// already passed.
    fn spin_until(&self, deadline: Timestamp) {
        while self.now() < deadline {
            std::hint::spin_loop();
        }
    }

    /// Busy-wait for `duration`, used by collaborators to occupy their cost.
    fn spin_for(&self, duration: Duration) {
        let deadline = self.now() + duration;
        self.spin_until(deadline);
    }
}

/// Platform monotonic clock backed by [`std::time::Instant`].
///
/// Copies share the same origin, so timestamps from any copy are comparable.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp(duration_micros(self.origin.elapsed()))
    }
}

/// Virtual clock that only moves when told to.
///
/// Clones share one timeline, so a simulated collaborator holding a clone can
/// advance the time seen by the executor. Spinning jumps straight to the
/// deadline. Single-context only (`!Sync`).
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_us: Rc<Cell<u64>>,
}

impl ManualClock {
    /// Create a clock positioned at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock positioned at `start`.
    #[must_use]
    pub fn starting_at(start: Timestamp) -> Self {
        Self {
            now_us: Rc::new(Cell::new(start.as_micros())),
        }
    }

    /// Move time forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.now_us
            .set(self.now_us.get().saturating_add(duration_micros(duration)));
    }

    /// Move time forward by `us` microseconds.
    pub fn advance_micros(&self, us: u64) {
        self.now_us.set(self.now_us.get().saturating_add(us));
    }
}

impl MonotonicClock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now_us.get())
    }

    fn spin_until(&self, deadline: Timestamp) {
        if self.now_us.get() < deadline.as_micros() {
            self.now_us.set(deadline.as_micros());
        }
    }
}
