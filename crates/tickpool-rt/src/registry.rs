use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::Sender;

use crate::channel::SharedChannel;
use crate::clock::Tick;
use crate::error::RuntimeError;
use crate::types::WorkerId;
use crate::worker::{Worker, WorkerReport};

/// Bookkeeping for one pool slot. The slot outlives the workers that occupy it.
#[derive(Debug)]
pub struct WorkerRecord {
    pub id: WorkerId,
    pub active: bool,
    pub messages_received: u64,
    pub start_time: Tick,
    /// `None` while the worker is active.
    pub end_time: Option<Tick>,
    handle: Option<JoinHandle<u64>>,
    thread_name: Option<String>,
}

impl WorkerRecord {
    fn vacant(id: WorkerId) -> Self {
        WorkerRecord {
            id,
            active: false,
            messages_received: 0,
            start_time: Tick::ZERO,
            end_time: None,
            handle: None,
            thread_name: None,
        }
    }

    /// Name of the thread running this slot's worker, while active.
    pub fn thread_name(&self) -> Option<&str> {
        self.thread_name.as_deref()
    }
}

/// A successful spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spawned {
    pub id: WorkerId,
    pub thread_name: String,
    pub at: Tick,
}

/// A successful termination and the accounting of the finished active period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Termination {
    pub id: WorkerId,
    pub messages_received: u64,
    pub start_time: Tick,
    pub end_time: Tick,
    pub active_period: u64,
}

/// The worker pool: a fixed arena of records indexed by [`WorkerId`].
///
/// Owned by the controller. Workers hold the channel and a report sender,
/// never the registry.
#[derive(Debug)]
pub struct Registry {
    records: Box<[WorkerRecord]>,
    channel: Arc<SharedChannel>,
    reports: Sender<WorkerReport>,
}

impl Registry {
    /// One slot per gate of `channel`.
    pub fn new(channel: Arc<SharedChannel>, reports: Sender<WorkerReport>) -> Self {
        let records = (0..channel.slots()).map(|i| WorkerRecord::vacant(WorkerId::new(i))).collect();
        Registry { records, channel, reports }
    }

    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    pub fn record(&self, id: WorkerId) -> Option<&WorkerRecord> {
        self.records.get(id.index())
    }

    pub fn is_active(&self, id: WorkerId) -> bool {
        self.record(id).is_some_and(|r| r.active)
    }

    /// Active slots in ascending order.
    pub fn active_identities(&self) -> Vec<WorkerId> {
        self.records.iter().filter(|r| r.active).map(|r| r.id).collect()
    }

    pub fn active_count(&self) -> usize {
        self.records.iter().filter(|r| r.active).count()
    }

    fn check(&self, id: WorkerId) -> Result<(), RuntimeError> {
        if id.index() < self.records.len() {
            Ok(())
        } else {
            Err(RuntimeError::InvalidWorker {
                label: id.label(),
                capacity: self.records.len(),
            })
        }
    }

    /// Starts a worker thread in slot `id`.
    ///
    /// Spawning onto an active slot is rejected and leaves the record untouched.
    pub fn spawn(&mut self, id: WorkerId, now: Tick) -> Result<Spawned, RuntimeError> {
        self.check(id)?;
        if self.records[id.index()].active {
            return Err(RuntimeError::AlreadyActive(id));
        }

        let thread_name = format!("tickpool-worker-{}", id);
        let worker = Worker::new(id, now, Arc::clone(&self.channel), self.reports.clone());
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || worker.run_loop())
            .map_err(|e| RuntimeError::SpawnFailed { id, reason: e.to_string() })?;

        let record = &mut self.records[id.index()];
        record.active = true;
        record.messages_received = 0;
        record.start_time = now;
        record.end_time = None;
        record.handle = Some(handle);
        record.thread_name = Some(thread_name.clone());
        log::info!("Spawned worker {} on thread {} at {}", id, thread_name, now);

        Ok(Spawned { id, thread_name, at: now })
    }

    /// Stops the worker in slot `id` and waits for its thread to exit.
    ///
    /// Returns `Ok(None)` without side effects when the slot is not active.
    pub fn terminate(&mut self, id: WorkerId, now: Tick) -> Result<Option<Termination>, RuntimeError> {
        self.check(id)?;
        if !self.records[id.index()].active {
            log::debug!("Terminate for inactive worker {} ignored", id);
            return Ok(None);
        }

        self.channel.publish_termination_sentinel()?;
        self.channel.signal(id)?;

        let record = &mut self.records[id.index()];
        let joined = record.handle.take().map(JoinHandle::join);
        record.active = false;
        record.end_time = Some(now);
        record.thread_name = None;

        match joined {
            Some(Ok(count)) => record.messages_received = count,
            Some(Err(_)) | None => {
                log::error!("Worker {} did not exit cleanly", id);
                return Err(RuntimeError::WorkerPanicked(id));
            }
        }

        let active_period = now.duration_since(record.start_time).unwrap_or(0);
        log::info!("Terminated worker {} at {} after {} ticks", id, now, active_period);
        Ok(Some(Termination {
            id,
            messages_received: record.messages_received,
            start_time: record.start_time,
            end_time: now,
            active_period,
        }))
    }

    /// Mirrors a delivery reported by a worker into its record.
    pub fn record_delivery(&mut self, id: WorkerId, count: u64) {
        if let Some(record) = self.records.get_mut(id.index()) {
            if record.active {
                record.messages_received = count;
            }
        }
    }
}
