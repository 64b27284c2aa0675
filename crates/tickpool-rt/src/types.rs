use std::fmt;

use tickpool_source::WorkerLabel;

/// The identifier for a worker slot within the pool.
///
/// Slots are 0-based; scripts and console output use the 1-based label (`C1` is slot 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(usize);

impl WorkerId {
    pub fn new(index: usize) -> Self {
        WorkerId(index)
    }

    /// Maps a script label onto a slot. `C0` has no slot.
    pub fn from_label(label: WorkerLabel) -> Option<Self> {
        (label.0 as usize).checked_sub(1).map(WorkerId)
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn label(self) -> WorkerLabel {
        WorkerLabel(self.0 as u32 + 1)
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
