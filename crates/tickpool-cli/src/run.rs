use std::path::{Path, PathBuf};

use tickpool_rt::{Controller, PoolConfig, RunSummary, StatusSink};
use tickpool_source::{load_script, ConfigOverrides, Corpus, SimConfig};

use crate::error::CliError;

/// Inputs for one simulation run, as collected from the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub commands: PathBuf,
    pub text: PathBuf,
    pub config_file: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

/// Layers the command line over the optional config file and validates the result.
pub fn resolve_config(config_file: Option<&Path>, overrides: &ConfigOverrides) -> Result<SimConfig, CliError> {
    let base = match config_file {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    let config = base.merge(overrides);
    config.validate()?;
    Ok(config)
}

pub fn handle_run<S: StatusSink>(options: &RunOptions, sink: S) -> Result<RunSummary, CliError> {
    // 1. Configuration errors abort before anything is created.
    let config = resolve_config(options.config_file.as_deref(), &options.overrides)?;
    log::debug!("Effective configuration: {:?}", config);

    // 2. Inputs
    let events = load_script(&options.commands)?;
    let corpus = Corpus::load(&options.text)?;
    if corpus.is_empty() {
        log::warn!("Text file {} is empty", options.text.display());
    }

    // 3. Shared channel, gates and pool
    let mut controller = Controller::new(&PoolConfig::from(&config), corpus, sink)?;

    // 4. Simulate
    let summary = controller.run(events);
    log::info!(
        "Run finished at {}: {} messages delivered, {} spawned, {} terminated, {} errors",
        summary.final_tick,
        summary.deliveries,
        summary.spawned,
        summary.terminated,
        summary.errors
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tickpool_rt::{StatusEvent, Tick};
    use tickpool_source::ConfigError;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    fn options(commands: &Path, text: &Path, workers: usize) -> RunOptions {
        RunOptions {
            commands: commands.to_path_buf(),
            text: text.to_path_buf(),
            config_file: None,
            overrides: ConfigOverrides { max_workers: Some(workers), tick_millis: Some(0), seed: Some(3) },
        }
    }

    #[test]
    fn runs_a_script_end_to_end() {
        let commands = write_temp("0 C1 S\n2 C2 S\n5 C1 T\n6 EXIT\n");
        let text = write_temp("one\ntwo\nthree\n");
        let mut events: Vec<StatusEvent> = Vec::new();

        let summary = handle_run(&options(commands.path(), text.path(), 2), &mut events).unwrap();
        assert_eq!(summary.deliveries, 5);
        assert_eq!(summary.exit_at, Some(Tick::new(6)));
        assert!(events.contains(&StatusEvent::Exit { at: Tick::new(6) }));
    }

    #[test]
    fn pool_size_is_checked_before_reading_inputs() {
        let missing = Path::new("/definitely/not/here");
        let err = handle_run(&options(missing, missing, 11), Vec::new()).unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::WorkerCountOutOfRange { got: 11, .. })));

        let err = handle_run(&options(missing, missing, 0), Vec::new()).unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::WorkerCountOutOfRange { got: 0, .. })));
    }

    #[test]
    fn missing_inputs_are_source_errors() {
        let text = write_temp("x\n");
        let err = handle_run(&options(Path::new("/no/such/script"), text.path(), 1), Vec::new()).unwrap_err();
        assert!(matches!(err, CliError::Source(_)));
    }

    #[test]
    fn command_line_overrides_config_file() {
        let file = write_temp("max_workers = 10\ntick_millis = 250\nseed = 9\n");
        let overrides = ConfigOverrides { max_workers: Some(4), tick_millis: None, seed: None };
        let config = resolve_config(Some(file.path()), &overrides).unwrap();
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.tick_millis, 250);
        assert_eq!(config.seed, Some(9));
    }
}
