use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SourceError};

/// Hard upper bound on the pool size.
pub const MAX_WORKERS: usize = 10;

/// Size of the shared message buffer in bytes.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Real-time length of one tick.
pub const DEFAULT_TICK_MILLIS: u64 = 1000;

/// Simulator settings, loadable from a `tickpool.toml` file.
///
/// Every field is optional in the file; command line flags are layered on
/// top with [`SimConfig::merge`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Number of worker slots in the pool.
    pub max_workers: usize,

    /// Pacing delay per tick, in milliseconds. Zero runs as fast as possible.
    pub tick_millis: u64,

    /// Seed for target selection. `None` draws from OS entropy.
    pub seed: Option<u64>,

    /// Capacity of the shared buffer in bytes.
    pub channel_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_workers: 1,
            tick_millis: DEFAULT_TICK_MILLIS,
            seed: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Command line overrides. `None` keeps the file (or default) value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub max_workers: Option<usize>,
    pub tick_millis: Option<u64>,
    pub seed: Option<u64>,
}

impl SimConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded configuration from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn merge(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(n) = overrides.max_workers {
            self.max_workers = n;
        }
        if let Some(ms) = overrides.tick_millis {
            self.tick_millis = ms;
        }
        if overrides.seed.is_some() {
            self.seed = overrides.seed;
        }
        self
    }

    /// Checks the invariants that must hold before any resource is acquired.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 || self.max_workers > MAX_WORKERS {
            return Err(ConfigError::WorkerCountOutOfRange {
                got: self.max_workers,
                max: MAX_WORKERS,
            });
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ZeroChannelCapacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = SimConfig::from_toml_str("max_workers = 4\nseed = 7\n").unwrap();
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.tick_millis, DEFAULT_TICK_MILLIS);
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = SimConfig::from_toml_str("workers = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn overrides_win_over_file_values() {
        let config = SimConfig::from_toml_str("max_workers = 4\ntick_millis = 10\n")
            .unwrap()
            .merge(&ConfigOverrides { max_workers: Some(2), tick_millis: None, seed: Some(1) });
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.tick_millis, 10);
        assert_eq!(config.seed, Some(1));
    }

    #[test]
    fn worker_count_bounds() {
        let mut config = SimConfig::default();
        for n in [1, MAX_WORKERS] {
            config.max_workers = n;
            assert!(config.validate().is_ok());
        }
        for n in [0, MAX_WORKERS + 1] {
            config.max_workers = n;
            assert_eq!(
                config.validate(),
                Err(ConfigError::WorkerCountOutOfRange { got: n, max: MAX_WORKERS })
            );
        }
    }

    #[test]
    fn zero_capacity_is_invalid() {
        let config = SimConfig { channel_capacity: 0, ..SimConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroChannelCapacity));
    }
}
