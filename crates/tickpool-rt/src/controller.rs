use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver};
use tickpool_source::{Command, Corpus, ScriptError, ScriptEvent, SimConfig, WorkerLabel};

use crate::channel::SharedChannel;
use crate::clock::{SimClock, Tick};
use crate::dispatcher::Dispatcher;
use crate::error::RuntimeError;
use crate::registry::Registry;
use crate::status::{StatusEvent, StatusSink};
use crate::types::WorkerId;
use crate::worker::WorkerReport;

/// Pool settings the controller is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub workers: usize,
    pub channel_capacity: usize,
    pub tick: Duration,
    pub seed: Option<u64>,
}

impl From<&SimConfig> for PoolConfig {
    fn from(config: &SimConfig) -> Self {
        PoolConfig {
            workers: config.max_workers,
            channel_capacity: config.channel_capacity,
            tick: Duration::from_millis(config.tick_millis),
            seed: config.seed,
        }
    }
}

/// Counters describing a finished (or in-progress) run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub final_tick: Tick,
    pub exit_at: Option<Tick>,
    pub deliveries: u64,
    pub spawned: u64,
    pub terminated: u64,
    pub errors: u64,
}

/// Drives the simulation: consumes script events, runs the dispatcher between
/// them, applies spawn/terminate commands and owns the shared channel.
///
/// There is exactly one controller per channel and it is the only thread
/// that publishes.
pub struct Controller<S: StatusSink> {
    clock: SimClock,
    registry: Registry,
    channel: Arc<SharedChannel>,
    dispatcher: Dispatcher,
    reports: Receiver<WorkerReport>,
    sink: S,
    summary: RunSummary,
    halted: bool,
    shut_down: bool,
}

impl<S: StatusSink> Controller<S> {
    /// Acquires the shared channel and gates and sets up an empty pool.
    pub fn new(config: &PoolConfig, corpus: Corpus, sink: S) -> Result<Self, RuntimeError> {
        let channel = Arc::new(SharedChannel::new(config.channel_capacity, config.workers)?);
        let (report_tx, reports) = unbounded();
        let registry = Registry::new(Arc::clone(&channel), report_tx);
        let dispatcher = Dispatcher::new(corpus.cursor(), config.tick, config.seed);
        log::info!(
            "Controller ready: {} worker slots, {} byte channel, {:?} per tick",
            config.workers,
            config.channel_capacity,
            config.tick
        );

        Ok(Controller {
            clock: SimClock::new(),
            registry,
            channel,
            dispatcher,
            reports,
            sink,
            summary: RunSummary::default(),
            halted: false,
            shut_down: false,
        })
    }

    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn channel(&self) -> &SharedChannel {
        &self.channel
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Consumes script entries until they run out or an `EXIT` is seen, then shuts down.
    ///
    /// Malformed entries are reported and skipped.
    pub fn run<I>(&mut self, entries: I) -> RunSummary
    where
        I: IntoIterator<Item = Result<ScriptEvent, ScriptError>>,
    {
        for entry in entries {
            match entry {
                Ok(event) => {
                    if self.handle(&event).is_break() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("Skipping script line: {}", e);
                    self.summary.errors += 1;
                    self.sink.emit(StatusEvent::ScriptError(e));
                }
            }
        }
        self.shutdown();
        self.summary.clone()
    }

    /// Applies one event after dispatching every tick up to its timestamp.
    pub fn handle(&mut self, event: &ScriptEvent) -> ControlFlow<()> {
        if self.halted {
            return ControlFlow::Break(());
        }

        match *event {
            ScriptEvent::Exit { at } => {
                let at = self.clock.jump_to(Tick::new(at));
                log::info!("EXIT at {}", at);
                self.summary.exit_at = Some(at);
                self.halted = true;
                self.sink.emit(StatusEvent::Exit { at });
                ControlFlow::Break(())
            }
            ScriptEvent::Command { at, label, command } => {
                self.advance_to(Tick::new(at));
                match self.slot_for(label) {
                    Ok(id) => self.apply(id, label, command),
                    Err(e) => self.report_error(e),
                }
                self.drain_reports();
                ControlFlow::Continue(())
            }
        }
    }

    fn slot_for(&self, label: WorkerLabel) -> Result<WorkerId, RuntimeError> {
        WorkerId::from_label(label)
            .filter(|id| id.index() < self.registry.capacity())
            .ok_or(RuntimeError::InvalidWorker {
                label,
                capacity: self.registry.capacity(),
            })
    }

    fn apply(&mut self, id: WorkerId, label: WorkerLabel, command: Command) {
        let now = self.clock.now();
        match command {
            Command::Spawn => match self.registry.spawn(id, now) {
                Ok(spawned) => {
                    self.summary.spawned += 1;
                    self.sink.emit(StatusEvent::Spawned {
                        id: spawned.id,
                        thread_name: spawned.thread_name,
                        at: spawned.at,
                    });
                }
                Err(e) => self.report_error(e),
            },
            Command::Terminate => self.terminate(id, now),
            Command::Unknown(command) => self.report_error(RuntimeError::UnknownCommand { command, label }),
        }
    }

    fn terminate(&mut self, id: WorkerId, now: Tick) {
        let outcome = self.registry.terminate(id, now);
        // The worker's own exit report goes out before the controller's summary.
        self.drain_reports();
        match outcome {
            Ok(Some(done)) => {
                self.summary.terminated += 1;
                self.sink.emit(StatusEvent::Terminated {
                    id: done.id,
                    active_period: done.active_period,
                });
            }
            Ok(None) => {}
            Err(e) => self.report_error(e),
        }
    }

    /// Runs dispatch ticks until the clock reaches `target`.
    fn advance_to(&mut self, target: Tick) {
        while self.clock.now() < target {
            match self.dispatcher.tick(&mut self.clock, &self.registry, &self.channel) {
                Ok(Some(_)) => self.summary.deliveries += 1,
                Ok(None) => {}
                Err(e) => self.report_error(e),
            }
            self.drain_reports();
        }
    }

    fn drain_reports(&mut self) {
        while let Ok(report) = self.reports.try_recv() {
            match report {
                WorkerReport::Started { id, at } => {
                    log::debug!("Worker {} started at {}", id, at);
                }
                WorkerReport::Received { id, payload, count } => {
                    self.registry.record_delivery(id, count);
                    self.sink.emit(StatusEvent::Received { id, payload });
                }
                WorkerReport::Exited { id, messages_received } => {
                    self.sink.emit(StatusEvent::WorkerExited { id, messages_received });
                }
            }
        }
    }

    fn report_error(&mut self, error: RuntimeError) {
        log::warn!("{}", error);
        self.summary.errors += 1;
        self.sink.emit(StatusEvent::RuntimeError(error));
    }

    /// Terminates every active worker at the current tick and releases the channel.
    ///
    /// Safe to call more than once; only the first call does anything.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        let at = self.clock.now();
        log::info!("Shutting down at {} with {} active workers", at, self.registry.active_count());

        for id in self.registry.active_identities() {
            self.terminate(id, at);
        }
        self.drain_reports();

        // Every worker has been joined; nothing references the channel any more.
        self.channel.release();
        self.summary.final_tick = at;
        self.halted = true;
        self.shut_down = true;
    }
}

impl<S: StatusSink> Drop for Controller<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<S: StatusSink> std::fmt::Debug for Controller<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("now", &self.clock.now())
            .field("active", &self.registry.active_identities())
            .field("summary", &self.summary)
            .field("shut_down", &self.shut_down)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(workers: usize) -> PoolConfig {
        PoolConfig {
            workers,
            channel_capacity: 64,
            tick: Duration::ZERO,
            seed: Some(17),
        }
    }

    fn cmd(at: u64, label: u32, c: char) -> ScriptEvent {
        ScriptEvent::Command { at, label: WorkerLabel(label), command: Command::from(c) }
    }

    #[test]
    fn zero_workers_is_a_resource_error() {
        let err = Controller::new(&config(0), Corpus::default(), Vec::new()).unwrap_err();
        assert!(matches!(err, RuntimeError::ResourceAcquisition(_)));
    }

    #[test]
    fn commands_apply_at_their_timestamp() {
        let mut events = Vec::new();
        let mut controller = Controller::new(&config(2), Corpus::from_lines(["x"]), &mut events).unwrap();

        assert!(controller.handle(&cmd(3, 1, 'S')).is_continue());
        assert_eq!(controller.now(), Tick::new(3));
        assert_eq!(controller.registry().record(WorkerId::new(0)).unwrap().start_time, Tick::new(3));
        controller.shutdown();
        assert!(controller.channel().is_released());
    }

    #[test]
    fn invalid_and_unknown_commands_are_reported() {
        let mut events = Vec::new();
        {
            let mut controller = Controller::new(&config(2), Corpus::from_lines(["x"]), &mut events).unwrap();
            controller.handle(&cmd(0, 3, 'T'));
            controller.handle(&cmd(0, 0, 'S'));
            controller.handle(&cmd(0, 1, 'Q'));
            assert_eq!(controller.summary().errors, 3);
            assert_eq!(controller.registry().active_count(), 0);
        }
        assert_eq!(
            events,
            vec![
                StatusEvent::RuntimeError(RuntimeError::InvalidWorker { label: WorkerLabel(3), capacity: 2 }),
                StatusEvent::RuntimeError(RuntimeError::InvalidWorker { label: WorkerLabel(0), capacity: 2 }),
                StatusEvent::RuntimeError(RuntimeError::UnknownCommand { command: 'Q', label: WorkerLabel(1) }),
            ]
        );
    }

    #[test]
    fn nothing_is_handled_after_exit() {
        let mut controller = Controller::new(&config(1), Corpus::from_lines(["x"]), Vec::new()).unwrap();
        assert!(controller.handle(&ScriptEvent::Exit { at: 4 }).is_break());
        assert!(controller.is_halted());
        assert!(controller.handle(&cmd(5, 1, 'S')).is_break());
        assert_eq!(controller.registry().active_count(), 0);
        assert_eq!(controller.summary().exit_at, Some(Tick::new(4)));
    }

    #[test]
    fn drop_terminates_active_workers() {
        let mut events = Vec::new();
        {
            let mut controller = Controller::new(&config(2), Corpus::from_lines(["x"]), &mut events).unwrap();
            controller.handle(&cmd(0, 1, 'S'));
            controller.handle(&cmd(0, 2, 'S'));
        }
        let exits = events
            .iter()
            .filter(|e| matches!(e, StatusEvent::Terminated { active_period: 0, .. }))
            .count();
        assert_eq!(exits, 2);
    }
}
