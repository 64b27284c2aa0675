//! Simulated time.
//!
//! The clock only moves forward, one tick at a time while dispatching, or
//! by jumping to a later timestamp. It is never rewound.

use std::fmt;

/// A logical timestamp in simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tick(u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    #[inline]
    pub fn new(ticks: u64) -> Self {
        Tick(ticks)
    }

    #[inline]
    pub fn ticks(self) -> u64 {
        self.0
    }

    /// Returns the number of ticks between two points in time, or `None`
    /// if `earlier` is actually later than `self`.
    #[inline]
    pub fn duration_since(self, earlier: Tick) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T={}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Tick,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Advances by exactly one tick.
    pub fn advance(&mut self) -> Tick {
        self.now = Tick(self.now.0.saturating_add(1));
        self.now
    }

    /// Moves the clock to `target` if it lies in the future; otherwise does nothing.
    pub fn jump_to(&mut self, target: Tick) -> Tick {
        if target > self.now {
            self.now = target;
        }
        self.now
    }
}
