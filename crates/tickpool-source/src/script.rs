//! Command script parsing.
//!
//! A script is a sequence of lines, each either `<timestamp> C<n> <command>`
//! or `<timestamp> EXIT`. Parsing is line oriented so a malformed line never
//! poisons the rest of the script.

use std::fmt;

use crate::error::ScriptError;

/// The command letter of a worker event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `S`: spawn the worker.
    Spawn,
    /// `T`: terminate the worker.
    Terminate,
    /// Any other letter. Kept so the controller can report it after time advances.
    Unknown(char),
}

impl From<char> for Command {
    fn from(c: char) -> Self {
        match c {
            'S' => Command::Spawn,
            'T' => Command::Terminate,
            other => Command::Unknown(other),
        }
    }
}

/// A worker label as written in the script: `C1` is label 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerLabel(pub u32);

impl fmt::Display for WorkerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// One parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptEvent {
    Command {
        at: u64,
        label: WorkerLabel,
        command: Command,
    },
    Exit {
        at: u64,
    },
}

impl ScriptEvent {
    /// The timestamp the event is scheduled for.
    pub fn at(&self) -> u64 {
        match self {
            ScriptEvent::Command { at, .. } | ScriptEvent::Exit { at } => *at,
        }
    }
}

/// Parses a single script line.
///
/// Returns `Ok(None)` for blank lines. `line_no` is 1-based and only used
/// for diagnostics.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<ScriptEvent>, ScriptError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let invalid_format = || ScriptError::InvalidFormat {
        line: line_no,
        text: trimmed.to_string(),
    };

    let mut tokens = trimmed.split_whitespace();
    let at = tokens
        .next()
        .and_then(|t| t.parse::<u64>().ok())
        .ok_or_else(invalid_format)?;
    let second = tokens.next().ok_or_else(invalid_format)?;

    match tokens.next() {
        Some(cmd_token) => {
            let label = parse_label(second).ok_or_else(|| ScriptError::InvalidIdentifier {
                line: line_no,
                token: second.to_string(),
            })?;
            // Only the first character of the command token counts.
            let command = cmd_token.chars().next().map(Command::from).ok_or_else(invalid_format)?;
            Ok(Some(ScriptEvent::Command { at, label, command }))
        }
        None if second == "EXIT" => Ok(Some(ScriptEvent::Exit { at })),
        None => Err(invalid_format()),
    }
}

fn parse_label(token: &str) -> Option<WorkerLabel> {
    let digits = token.strip_prefix('C')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(WorkerLabel)
}

/// Parses a whole script, keeping per-line failures in place.
pub fn parse_script(text: &str) -> Vec<Result<ScriptEvent, ScriptError>> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| parse_line(idx + 1, line).transpose())
        .collect()
}
