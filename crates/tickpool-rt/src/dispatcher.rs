//! Per-tick message dispatch.
//!
//! Each tick with at least one active worker publishes the next corpus line
//! and signals exactly one worker. Target selection draws a random slot and
//! probes forward circularly to the next active one, so slots right after a
//! run of inactive slots are picked more often than the rest.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tickpool_source::CorpusCursor;

use crate::channel::SharedChannel;
use crate::clock::{SimClock, Tick};
use crate::error::RuntimeError;
use crate::registry::Registry;
use crate::types::WorkerId;

/// Read-only view of which slots are active.
pub trait ActiveSet {
    fn capacity(&self) -> usize;
    fn is_active(&self, id: WorkerId) -> bool;
}

impl ActiveSet for Registry {
    fn capacity(&self) -> usize {
        Registry::capacity(self)
    }

    fn is_active(&self, id: WorkerId) -> bool {
        Registry::is_active(self, id)
    }
}

impl ActiveSet for [bool] {
    fn capacity(&self) -> usize {
        self.len()
    }

    fn is_active(&self, id: WorkerId) -> bool {
        self.get(id.index()).copied().unwrap_or(false)
    }
}

/// One published message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub tick: Tick,
    pub target: WorkerId,
    pub payload: String,
}

#[derive(Debug)]
pub struct Dispatcher<R = StdRng> {
    rng: R,
    corpus: CorpusCursor,
    pacing: Duration,
    warned_empty: bool,
}

impl Dispatcher<StdRng> {
    /// A dispatcher seeded from `seed`, or from OS entropy when `None`.
    pub fn new(corpus: CorpusCursor, pacing: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Dispatcher::with_rng(corpus, pacing, rng)
    }
}

impl<R: Rng> Dispatcher<R> {
    pub fn with_rng(corpus: CorpusCursor, pacing: Duration, rng: R) -> Self {
        Dispatcher {
            rng,
            corpus,
            pacing,
            warned_empty: false,
        }
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Picks the target for this tick, or `None` if no slot is active.
    pub fn select_target<A: ActiveSet + ?Sized>(&mut self, active: &A) -> Option<WorkerId> {
        let capacity = active.capacity();
        if capacity == 0 {
            return None;
        }
        let start = self.rng.random_range(0..capacity);
        (0..capacity)
            .map(|offset| WorkerId::new((start + offset) % capacity))
            .find(|&id| active.is_active(id))
    }

    /// Runs one tick: publish and signal if anyone is active, pace, advance the clock.
    ///
    /// The clock advances even when publishing fails.
    pub fn tick<A: ActiveSet + ?Sized>(
        &mut self,
        clock: &mut SimClock,
        active: &A,
        channel: &SharedChannel,
    ) -> Result<Option<Delivery>, RuntimeError> {
        let tick = clock.now();
        let outcome = self.deliver(tick, active, channel);

        if !self.pacing.is_zero() {
            std::thread::sleep(self.pacing);
        }
        clock.advance();
        outcome
    }

    fn deliver<A: ActiveSet + ?Sized>(
        &mut self,
        tick: Tick,
        active: &A,
        channel: &SharedChannel,
    ) -> Result<Option<Delivery>, RuntimeError> {
        let Some(target) = self.select_target(active) else {
            log::debug!("{}: no active workers, nothing to dispatch", tick);
            return Ok(None);
        };

        let Some(line) = self.corpus.next_line() else {
            if !self.warned_empty {
                log::warn!("Corpus is empty; no messages will be dispatched");
                self.warned_empty = true;
            }
            return Ok(None);
        };
        let payload = line.to_string();

        // Publish strictly before signal: the woken worker must find its payload.
        channel.publish(&payload)?;
        channel.signal(target)?;
        log::debug!("{}: dispatched {} bytes to worker {}", tick, payload.len(), target);

        Ok(Some(Delivery { tick, target, payload }))
    }
}
