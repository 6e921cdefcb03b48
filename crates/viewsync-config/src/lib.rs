use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// How host selection changes are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStrategy {
    /// React to a host "selection possibly changed" signal.
    #[default]
    Event,
    /// Re-read the host selection on a recurring timer.
    Timer,
}

/// Timing and capacity knobs for the reconciliation engine.
///
/// Every field has a default, so a config file only needs the keys it
/// wants to override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Debounce before a burst of dirty notifications is settled.
    pub settle_delay_ms: u64,
    /// Grace window after a composition ends before settling.
    pub composition_grace_ms: u64,
    /// Interval of the timer-driven selection poller.
    pub poll_interval_ms: u64,
    /// How long a `poll(origin)` tag stays attached to signal-driven reads.
    pub origin_window_ms: u64,
    /// Records a mapping ledger accepts before it stops tracking.
    pub ledger_capacity: usize,
    pub selection_strategy: SelectionStrategy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 20,
            composition_grace_ms: 50,
            poll_interval_ms: 100,
            origin_window_ms: 50,
            ledger_capacity: 200,
            selection_strategy: SelectionStrategy::Event,
        }
    }
}

impl SyncConfig {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: SyncConfig =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    /// Load from the default location, falling back to defaults when absent.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        Ok(Self::load_from_path(&config_path)?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/viewsync");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn composition_grace(&self) -> Duration {
        Duration::from_millis(self.composition_grace_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn origin_window(&self) -> Duration {
        Duration::from_millis(self.origin_window_ms)
    }
}
