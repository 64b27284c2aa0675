use tickpool_source::ScriptError;

use crate::clock::Tick;
use crate::error::RuntimeError;
use crate::types::WorkerId;

/// Everything the simulation has to tell the outside world, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    Spawned { id: WorkerId, thread_name: String, at: Tick },
    /// A worker consumed a message.
    Received { id: WorkerId, payload: String },
    /// A worker saw the sentinel; its final report.
    WorkerExited { id: WorkerId, messages_received: u64 },
    /// The controller joined a worker.
    Terminated { id: WorkerId, active_period: u64 },
    Exit { at: Tick },
    ScriptError(ScriptError),
    RuntimeError(RuntimeError),
}

/// Consumer of [`StatusEvent`]s, e.g. the console.
pub trait StatusSink {
    fn emit(&mut self, event: StatusEvent);
}

/// Collects events in memory.
impl StatusSink for Vec<StatusEvent> {
    fn emit(&mut self, event: StatusEvent) {
        self.push(event);
    }
}

impl<S: StatusSink + ?Sized> StatusSink for &mut S {
    fn emit(&mut self, event: StatusEvent) {
        (**self).emit(event);
    }
}

impl<S: StatusSink + ?Sized> StatusSink for Box<S> {
    fn emit(&mut self, event: StatusEvent) {
        (**self).emit(event);
    }
}
