use parking_lot::{Condvar, Mutex};

/// A counting wait/notify gate, one per worker slot.
///
/// Signals accumulate: two `signal` calls before a `wait` let two `wait`
/// calls through. Nothing is ever lost or collapsed.
#[derive(Debug, Default)]
pub struct Gate {
    count: Mutex<u32>,
    cond: Condvar,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) {
        let mut count = self.count.lock();
        *count += 1;
        self.cond.notify_one();
    }

    /// Blocks until the count is positive, then takes one unit.
    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count == 0 {
            self.cond.wait(&mut count);
        }
        *count -= 1;
    }

    /// Number of signals not yet consumed.
    pub fn pending(&self) -> u32 {
        *self.count.lock()
    }
}
