use std::path::PathBuf;
use thiserror::Error;
use miette::Diagnostic;

/// Problems with a single line of the command script.
///
/// These are never fatal: the driver reports them and moves on to the next line.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// The line matched neither `<ts> C<n> <cmd>` nor `<ts> EXIT`.
    #[error("Invalid command format on line {line}: {text}")]
    #[diagnostic(
        code("SCRIPT-001"),
        help("Expected `<timestamp> C<n> <S|T>` or `<timestamp> EXIT`")
    )]
    InvalidFormat { line: usize, text: String },

    /// The worker token was not `C` followed by digits.
    #[error("Invalid process identifier on line {line}: {token}")]
    #[diagnostic(
        code("SCRIPT-002"),
        help("Workers are named C1, C2, ... up to the configured pool size")
    )]
    InvalidIdentifier { line: usize, token: String },
}

/// Configuration errors. All of them abort before any resource is created.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_workers must be between 1 and {max} (got {got})")]
    #[diagnostic(code("CONFIG-001"))]
    WorkerCountOutOfRange { got: usize, max: usize },

    #[error("channel_capacity must be at least 1 byte")]
    #[diagnostic(code("CONFIG-002"))]
    ZeroChannelCapacity,

    #[error("Invalid configuration file: {0}")]
    #[diagnostic(
        code("CONFIG-003"),
        help("Check your tickpool.toml syntax; known keys are max_workers, tick_millis, seed and channel_capacity")
    )]
    Parse(String),
}

/// Failures reading input files from disk.
#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    #[error("Failed to read {path}")]
    #[diagnostic(code("SOURCE-001"), help("Make sure the path exists and has proper permissions"))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// Conversion from toml::de::Error to ConfigError
impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
