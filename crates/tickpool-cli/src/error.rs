use miette::Diagnostic;
use thiserror::Error;
use tickpool_rt::RuntimeError;
use tickpool_source::{ConfigError, SourceError};

/// CLI-specific error type that provides rich diagnostics.
///
/// Every variant ends the process with exit status 1.
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),

    #[error("Runtime error: {0}")]
    #[diagnostic(
        code(tickpool::cli::runtime_error),
        help("The shared channel or its gates could not be set up")
    )]
    Runtime(#[from] RuntimeError),
}
