use std::sync::Arc;

use crossbeam::channel::Sender;

use crate::channel::{Payload, SharedChannel};
use crate::clock::Tick;
use crate::types::WorkerId;

/// Lifecycle of a worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Starting,
    Waiting,
    Processing,
    Terminating,
    Terminated,
}

/// Status reports a worker sends back to the controller.
///
/// Workers never touch the registry; these reports are their only output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerReport {
    Started { id: WorkerId, at: Tick },
    Received { id: WorkerId, payload: String, count: u64 },
    Exited { id: WorkerId, messages_received: u64 },
}

/// A single worker. Owned by its thread once spawned.
///
/// The worker sleeps on its own gate and, each time it is woken, consumes
/// whatever sits in the shared slot: a message bumps its counter, the
/// termination sentinel ends the loop.
#[derive(Debug)]
pub struct Worker {
    id: WorkerId,
    channel: Arc<SharedChannel>,
    reports: Sender<WorkerReport>,
    state: WorkerState,
    messages_received: u64,
    start_time: Tick,
}

impl Worker {
    pub fn new(id: WorkerId, start_time: Tick, channel: Arc<SharedChannel>, reports: Sender<WorkerReport>) -> Self {
        Worker {
            id,
            channel,
            reports,
            state: WorkerState::Starting,
            messages_received: 0,
            start_time,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received
    }

    /// Runs the worker until it observes the termination sentinel.
    ///
    /// Returns the number of messages received, which becomes the thread's join value.
    pub fn run_loop(mut self) -> u64 {
        log::debug!("Worker {} entering run loop at {}.", self.id, self.start_time);
        self.report(WorkerReport::Started { id: self.id, at: self.start_time });
        self.state = WorkerState::Waiting;

        while self.state != WorkerState::Terminated {
            self.step();
        }

        log::debug!("Worker {} exiting run loop.", self.id);
        self.messages_received
    }

    /// Waits for one signal and handles it. A terminated worker ignores further calls.
    pub fn step(&mut self) -> WorkerState {
        if self.state == WorkerState::Terminated {
            return self.state;
        }
        self.state = WorkerState::Waiting;

        if let Err(e) = self.channel.await_signal(self.id) {
            // Our gate does not exist; nothing can ever wake us again.
            log::error!("Worker {} cannot wait on its gate: {}", self.id, e);
            self.state = WorkerState::Terminated;
            return self.state;
        }

        self.state = WorkerState::Processing;
        let payload = self.channel.read();
        self.channel.acknowledge();

        match payload {
            Payload::Terminate => {
                self.state = WorkerState::Terminating;
                self.report(WorkerReport::Exited {
                    id: self.id,
                    messages_received: self.messages_received,
                });
                self.state = WorkerState::Terminated;
            }
            Payload::Message(text) => {
                self.messages_received += 1;
                self.report(WorkerReport::Received {
                    id: self.id,
                    payload: text,
                    count: self.messages_received,
                });
                self.state = WorkerState::Waiting;
            }
            Payload::Empty => {
                log::warn!("Worker {} woken with an empty channel", self.id);
                self.state = WorkerState::Waiting;
            }
        }
        self.state
    }

    fn report(&self, report: WorkerReport) {
        if self.reports.send(report).is_err() {
            log::debug!("Worker {}: controller no longer listening for reports", self.id);
        }
    }
}
