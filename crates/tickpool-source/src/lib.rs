//! Input side of the tickpool simulator.
//!
//! This crate is responsible for:
//! - Parsing the timestamped command script into [`ScriptEvent`]s
//! - Loading the text corpus and cycling through it
//! - Loading and validating [`SimConfig`] from TOML and command line overrides
//!
//! Nothing here touches threads or the shared channel; the runtime crate
//! consumes these values.

mod config;
mod corpus;
mod error;
mod script;

pub use config::{ConfigOverrides, SimConfig, DEFAULT_CHANNEL_CAPACITY, DEFAULT_TICK_MILLIS, MAX_WORKERS};
pub use corpus::{Corpus, CorpusCursor};
pub use error::{ConfigError, ScriptError, SourceError};
pub use script::{parse_line, parse_script, Command, ScriptEvent, WorkerLabel};

use std::path::Path;

/// Reads and parses a command script file.
pub fn load_script(path: &Path) -> Result<Vec<Result<ScriptEvent, ScriptError>>, SourceError> {
    let text = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let events = parse_script(&text);
    log::debug!("Parsed {} script entries from {}", events.len(), path.display());
    Ok(events)
}
