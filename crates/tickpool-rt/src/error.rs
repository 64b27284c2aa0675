use thiserror::Error;
use tickpool_source::WorkerLabel;

use crate::types::WorkerId;

/// Errors specific to the tickpool runtime.
///
/// `ResourceAcquisition` is fatal; everything else is reported by the
/// controller and the simulation carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Failed to acquire the shared channel: {0}")]
    ResourceAcquisition(String),

    #[error("Payload of {len} bytes exceeds the channel capacity of {capacity} bytes")]
    CapacityExceeded { len: usize, capacity: usize },

    #[error("The shared channel has already been released")]
    ChannelReleased,

    #[error("Invalid process index: {label} (pool has {capacity} slots)")]
    InvalidWorker { label: WorkerLabel, capacity: usize },

    #[error("Worker {0} is already active")]
    AlreadyActive(WorkerId),

    #[error("Unknown command '{command}' for worker {label}")]
    UnknownCommand { command: char, label: WorkerLabel },

    #[error("Failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: WorkerId, reason: String },

    #[error("Worker {0} panicked before acknowledging termination")]
    WorkerPanicked(WorkerId),
}
