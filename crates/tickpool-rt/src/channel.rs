//! The shared channel between the controller and its workers.
//!
//! One bounded message slot plus one [`Gate`] per worker. The controller
//! publishes into the slot and then signals exactly one gate; the woken
//! worker reads the slot and acknowledges it. A second publish waits for
//! that acknowledgment, so a payload is never overwritten before its
//! addressee has seen it.

use parking_lot::{Condvar, Mutex};

use crate::error::RuntimeError;
use crate::gate::Gate;
use crate::types::WorkerId;

/// Content of the shared slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Nothing has been published yet.
    Empty,
    Message(String),
    /// The termination sentinel. Distinct from every corpus line.
    Terminate,
}

#[derive(Debug)]
struct Slot {
    payload: Payload,
    /// Set by a publish, cleared by the consumer's acknowledgment.
    outstanding: bool,
    released: bool,
}

#[derive(Debug)]
pub struct SharedChannel {
    capacity: usize,
    slot: Mutex<Slot>,
    consumed: Condvar,
    gates: Box<[Gate]>,
}

impl SharedChannel {
    /// Creates the buffer and `slots` gates, all with an initial count of zero.
    pub fn new(capacity: usize, slots: usize) -> Result<Self, RuntimeError> {
        if capacity == 0 {
            return Err(RuntimeError::ResourceAcquisition(
                "channel capacity must be non-zero".to_string(),
            ));
        }
        if slots == 0 {
            return Err(RuntimeError::ResourceAcquisition(
                "at least one gate is required".to_string(),
            ));
        }
        log::debug!("Creating shared channel: {} bytes, {} gates", capacity, slots);
        Ok(Self {
            capacity,
            slot: Mutex::new(Slot {
                payload: Payload::Empty,
                outstanding: false,
                released: false,
            }),
            consumed: Condvar::new(),
            gates: (0..slots).map(|_| Gate::new()).collect(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn slots(&self) -> usize {
        self.gates.len()
    }

    /// Writes a message into the slot, waiting for the previous one to be consumed.
    pub fn publish(&self, payload: &str) -> Result<(), RuntimeError> {
        if payload.len() > self.capacity {
            return Err(RuntimeError::CapacityExceeded {
                len: payload.len(),
                capacity: self.capacity,
            });
        }
        self.write(Payload::Message(payload.to_string()))
    }

    pub fn publish_termination_sentinel(&self) -> Result<(), RuntimeError> {
        self.write(Payload::Terminate)
    }

    fn write(&self, payload: Payload) -> Result<(), RuntimeError> {
        let mut slot = self.slot.lock();
        while slot.outstanding && !slot.released {
            self.consumed.wait(&mut slot);
        }
        if slot.released {
            return Err(RuntimeError::ChannelReleased);
        }
        slot.payload = payload;
        slot.outstanding = true;
        Ok(())
    }

    /// Returns the current content without consuming it.
    pub fn read(&self) -> Payload {
        self.slot.lock().payload.clone()
    }

    /// Marks the current payload as consumed and lets a pending publish through.
    pub fn acknowledge(&self) {
        let mut slot = self.slot.lock();
        slot.outstanding = false;
        self.consumed.notify_all();
    }

    /// `true` while a published payload has not been acknowledged.
    pub fn is_outstanding(&self) -> bool {
        self.slot.lock().outstanding
    }

    pub fn signal(&self, worker: WorkerId) -> Result<(), RuntimeError> {
        self.gate(worker)?.signal();
        Ok(())
    }

    pub fn await_signal(&self, worker: WorkerId) -> Result<(), RuntimeError> {
        self.gate(worker)?.wait();
        Ok(())
    }

    /// Signals waiting on `worker`'s gate that have not been consumed yet.
    pub fn pending_signals(&self, worker: WorkerId) -> Result<u32, RuntimeError> {
        Ok(self.gate(worker)?.pending())
    }

    fn gate(&self, worker: WorkerId) -> Result<&Gate, RuntimeError> {
        self.gates.get(worker.index()).ok_or(RuntimeError::InvalidWorker {
            label: worker.label(),
            capacity: self.gates.len(),
        })
    }

    /// Releases the channel. Later publishes fail; publishes blocked on an
    /// acknowledgment are woken and fail too.
    pub fn release(&self) {
        let mut slot = self.slot.lock();
        if !slot.released {
            log::debug!("Releasing shared channel");
            slot.released = true;
            slot.payload = Payload::Empty;
            self.consumed.notify_all();
        }
    }

    pub fn is_released(&self) -> bool {
        self.slot.lock().released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn creation_requires_capacity_and_gates() {
        assert!(matches!(SharedChannel::new(0, 2), Err(RuntimeError::ResourceAcquisition(_))));
        assert!(matches!(SharedChannel::new(16, 0), Err(RuntimeError::ResourceAcquisition(_))));
        let channel = SharedChannel::new(16, 2).unwrap();
        assert_eq!(channel.capacity(), 16);
        assert_eq!(channel.slots(), 2);
        assert_eq!(channel.read(), Payload::Empty);
    }

    #[test]
    fn publish_rejects_oversized_payloads() {
        let channel = SharedChannel::new(4, 1).unwrap();
        assert_eq!(
            channel.publish("hello"),
            Err(RuntimeError::CapacityExceeded { len: 5, capacity: 4 })
        );
        assert!(!channel.is_outstanding());
        channel.publish("four").unwrap();
        assert_eq!(channel.read(), Payload::Message("four".into()));
    }

    #[test]
    fn read_is_not_consuming() {
        let channel = SharedChannel::new(32, 1).unwrap();
        channel.publish("twice").unwrap();
        assert_eq!(channel.read(), channel.read());
        assert!(channel.is_outstanding());
    }

    #[test]
    fn sentinel_text_is_an_ordinary_message() {
        let channel = SharedChannel::new(32, 1).unwrap();
        channel.publish("TERMINATE").unwrap();
        assert_ne!(channel.read(), Payload::Terminate);
    }

    #[test]
    fn signals_target_a_single_gate() {
        let channel = SharedChannel::new(32, 3).unwrap();
        channel.signal(WorkerId::new(1)).unwrap();
        assert_eq!(channel.pending_signals(WorkerId::new(0)).unwrap(), 0);
        assert_eq!(channel.pending_signals(WorkerId::new(1)).unwrap(), 1);
        assert_eq!(channel.pending_signals(WorkerId::new(2)).unwrap(), 0);
        assert!(matches!(
            channel.signal(WorkerId::new(3)),
            Err(RuntimeError::InvalidWorker { capacity: 3, .. })
        ));
    }

    #[test]
    fn second_publish_waits_for_acknowledgment() {
        let channel = Arc::new(SharedChannel::new(32, 1).unwrap());
        channel.publish("first").unwrap();

        let publisher = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.publish("second"))
        };
        thread::sleep(Duration::from_millis(50));
        assert_eq!(channel.read(), Payload::Message("first".into()));

        channel.acknowledge();
        publisher.join().unwrap().unwrap();
        assert_eq!(channel.read(), Payload::Message("second".into()));
    }

    #[test]
    fn release_wakes_blocked_publishers() {
        let channel = Arc::new(SharedChannel::new(32, 1).unwrap());
        channel.publish("stuck").unwrap();

        let publisher = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.publish_termination_sentinel())
        };
        thread::sleep(Duration::from_millis(20));
        channel.release();
        assert_eq!(publisher.join().unwrap(), Err(RuntimeError::ChannelReleased));
        assert!(channel.is_released());
        assert_eq!(channel.publish("late"), Err(RuntimeError::ChannelReleased));
    }
}
