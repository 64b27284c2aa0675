use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use tickpool_source::{ConfigOverrides, MAX_WORKERS};

mod console;
mod error;
mod run;

use console::ConsoleSink;
use run::{handle_run, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "tickpool")]
#[command(about = "Discrete-time simulator of a worker pool fed through one shared channel", long_about = None)]
struct Args {
    /// Timestamped command script (`<t> C<n> S|T` or `<t> EXIT` per line)
    #[arg(value_name = "COMMANDS_FILE")]
    commands: PathBuf,

    /// Text corpus; one line is delivered per tick
    #[arg(value_name = "TEXT_FILE")]
    text: PathBuf,

    /// Number of worker slots
    #[arg(value_name = "MAX_WORKERS", help = format!("Number of worker slots (1-{})", MAX_WORKERS))]
    max_workers: usize,

    /// Real-time length of one tick in milliseconds
    #[arg(long, value_name = "MS")]
    tick_ms: Option<u64>,

    /// Seed for worker selection
    #[arg(long)]
    seed: Option<u64>,

    /// Optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

impl Args {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            commands: self.commands.clone(),
            text: self.text.clone(),
            config_file: self.config.clone(),
            overrides: ConfigOverrides {
                max_workers: Some(self.max_workers),
                tick_millis: self.tick_ms,
                seed: self.seed,
            },
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
            if let Err(print_err) = e.print() {
                eprintln!("{}", print_err);
            }
            return code;
        }
    };

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .parse_default_env()
        .init();

    match handle_run(&args.run_options(), ConsoleSink::stdio()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{:?}", miette::Report::new(e));
            ExitCode::FAILURE
        }
    }
}
