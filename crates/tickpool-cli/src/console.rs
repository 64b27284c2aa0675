use std::io::{self, Write};

use tickpool_rt::{StatusEvent, StatusSink};

/// Which stream a status line belongs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Out,
    Err,
}

/// Renders a status event the way it appears on the console.
pub fn render(event: &StatusEvent) -> (Stream, String) {
    match event {
        StatusEvent::Spawned { id, thread_name, at } => (
            Stream::Out,
            format!("Spawned worker {} on thread {} at {}", id, thread_name, at),
        ),
        StatusEvent::Received { id, payload } => {
            (Stream::Out, format!("Worker {} received: [{}]", id, payload))
        }
        StatusEvent::WorkerExited { id, messages_received } => (
            Stream::Out,
            format!("Worker {} terminated:\n\tMessages received: {}", id, messages_received),
        ),
        StatusEvent::Terminated { active_period, .. } => {
            (Stream::Out, format!("\tNumber of steps: {}", active_period))
        }
        StatusEvent::Exit { at } => (
            Stream::Out,
            format!("EXIT command received at {}. Terminating.", at),
        ),
        StatusEvent::ScriptError(e) => (Stream::Err, e.to_string()),
        StatusEvent::RuntimeError(e) => (Stream::Err, e.to_string()),
    }
}

/// Writes status lines to a pair of streams, stdout/stderr by default.
pub struct ConsoleSink<O: Write, E: Write> {
    out: O,
    err: E,
}

impl ConsoleSink<io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        ConsoleSink::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> ConsoleSink<O, E> {
    pub fn new(out: O, err: E) -> Self {
        ConsoleSink { out, err }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write, E: Write> StatusSink for ConsoleSink<O, E> {
    fn emit(&mut self, event: StatusEvent) {
        let (stream, line) = render(&event);
        let result = match stream {
            Stream::Out => writeln!(self.out, "{}", line).and_then(|_| self.out.flush()),
            Stream::Err => writeln!(self.err, "{}", line),
        };
        if let Err(e) = result {
            log::error!("Failed to write status line: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickpool_rt::{RuntimeError, Tick, WorkerId};

    #[test]
    fn renders_worker_lifecycle() {
        let id = WorkerId::new(0);
        assert_eq!(
            render(&StatusEvent::Received { id, payload: "hello".into() }),
            (Stream::Out, "Worker C1 received: [hello]".to_string())
        );
        assert_eq!(
            render(&StatusEvent::WorkerExited { id, messages_received: 3 }).1,
            "Worker C1 terminated:\n\tMessages received: 3"
        );
        assert_eq!(
            render(&StatusEvent::Terminated { id, active_period: 5 }).1,
            "\tNumber of steps: 5"
        );
        assert_eq!(
            render(&StatusEvent::Exit { at: Tick::new(6) }).1,
            "EXIT command received at T=6. Terminating."
        );
    }

    #[test]
    fn errors_go_to_stderr() {
        let mut sink = ConsoleSink::new(Vec::new(), Vec::new());
        sink.emit(StatusEvent::RuntimeError(RuntimeError::AlreadyActive(WorkerId::new(1))));
        sink.emit(StatusEvent::Spawned {
            id: WorkerId::new(0),
            thread_name: "tickpool-worker-C1".into(),
            at: Tick::ZERO,
        });

        let (out, err) = sink.into_inner();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Spawned worker C1 on thread tickpool-worker-C1 at T=0\n"
        );
        assert_eq!(String::from_utf8(err).unwrap(), "Worker C2 is already active\n");
    }
}
