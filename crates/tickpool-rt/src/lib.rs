//! The tickpool runtime: a pool of worker threads fed one message per
//! simulated tick through a single shared channel.
//!
//! ```text
//! Controller ── owns ──> Registry ── spawns/joins ──> Worker threads
//!     │                                                  ▲
//!     └─ Dispatcher ── publish + signal ──> SharedChannel ┘
//! ```
//!
//! The controller is the only publisher. Each worker waits on its own gate,
//! so a signal always reaches exactly the worker the payload was meant for.

pub mod channel;
pub mod clock;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod registry;
pub mod status;
pub mod types;
pub mod worker;

pub use channel::{Payload, SharedChannel};
pub use clock::{SimClock, Tick};
pub use controller::{Controller, PoolConfig, RunSummary};
pub use dispatcher::{ActiveSet, Delivery, Dispatcher};
pub use error::RuntimeError;
pub use gate::Gate;
pub use registry::{Registry, Spawned, Termination, WorkerRecord};
pub use status::{StatusEvent, StatusSink};
pub use types::WorkerId;
pub use worker::{Worker, WorkerReport, WorkerState};
