//! Playback configuration and mode persistence

use crate::error::{PlaybackError, Result};
use crate::types::{RepeatMode, ShuffleMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Engine configuration
///
/// Loaded from defaults, an optional TOML file and `SEGUE_*` environment
/// variables, in that order of precedence (last wins).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaybackConfig {
    /// Repeat mode at startup
    #[serde(default)]
    pub repeat: RepeatMode,

    /// Shuffle mode at startup
    #[serde(default)]
    pub shuffle: ShuffleMode,

    /// Step for seek forward/backward, in seconds
    #[serde(default = "default_seek_step_secs")]
    pub seek_step_secs: f64,

    /// Prepare likely-next tracks in the background
    #[serde(default = "default_prefetch")]
    pub prefetch: bool,

    /// How many shuffled tracks `previous()` can walk back through
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            repeat: RepeatMode::default(),
            shuffle: ShuffleMode::default(),
            seek_step_secs: default_seek_step_secs(),
            prefetch: default_prefetch(),
            history_size: default_history_size(),
        }
    }
}

impl PlaybackConfig {
    /// Load configuration from an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, "SEGUE")
    }

    fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(PlaybackError::config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            settings = settings.add_source(config::File::from(path.to_path_buf()));
        }

        // Override with environment variables (SEGUE_SEEK_STEP_SECS, ...)
        settings = settings.add_source(
            config::Environment::with_prefix(prefix)
                .prefix_separator("_")
                .try_parsing(true),
        );

        let config: Self = settings
            .build()
            .map_err(|e| PlaybackError::config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| PlaybackError::config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.seek_step_secs.is_finite() || self.seek_step_secs <= 0.0 {
            return Err(PlaybackError::config(format!(
                "seek_step_secs must be a positive number, got {}",
                self.seek_step_secs
            )));
        }

        if self.history_size == 0 {
            return Err(PlaybackError::config("history_size must be at least 1"));
        }

        Ok(())
    }

    /// Modes to start with
    pub fn mode_settings(&self) -> ModeSettings {
        ModeSettings {
            repeat: self.repeat,
            shuffle: self.shuffle,
        }
    }
}

// Default values
fn default_seek_step_secs() -> f64 {
    5.0
}

fn default_prefetch() -> bool {
    true
}

fn default_history_size() -> usize {
    50
}

/// Persisted repeat and shuffle modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ModeSettings {
    /// Repeat mode
    #[serde(default)]
    pub repeat: RepeatMode,

    /// Shuffle mode
    #[serde(default)]
    pub shuffle: ShuffleMode,
}

/// Where modes are kept between runs
pub trait SettingsStore {
    /// Read stored modes (defaults if nothing was stored yet)
    fn load_modes(&self) -> Result<ModeSettings>;

    /// Store modes
    fn save_modes(&self, modes: &ModeSettings) -> Result<()>;
}

/// Modes stored as a JSON file
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    /// Store backed by a file (created on first save)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load_modes(&self) -> Result<ModeSettings> {
        if !self.path.exists() {
            return Ok(ModeSettings::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save_modes(&self, modes: &ModeSettings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(modes)?)?;
        tracing::debug!("Saved modes to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = PlaybackConfig::default();
        assert_eq!(config.seek_step_secs, 5.0);
        assert!(config.prefetch);
        assert_eq!(config.history_size, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loads_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "repeat = \"All\"\nseek_step_secs = 10.0\nprefetch = false").unwrap();

        let config = PlaybackConfig::load_with_prefix(Some(file.path()), "SEGUE_TEST_FILE").unwrap();
        assert_eq!(config.repeat, RepeatMode::All);
        assert_eq!(config.shuffle, ShuffleMode::Off);
        assert_eq!(config.seek_step_secs, 10.0);
        assert!(!config.prefetch);
        assert_eq!(config.history_size, 50);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = PlaybackConfig::load(Some(Path::new("/nonexistent/segue.toml")));
        assert!(matches!(result, Err(PlaybackError::Config(_))));
    }

    #[test]
    fn rejects_bad_values() {
        let config = PlaybackConfig {
            seek_step_secs: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PlaybackConfig {
            history_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("nested").join("modes.json"));

        assert_eq!(store.load_modes().unwrap(), ModeSettings::default());

        let modes = ModeSettings {
            repeat: RepeatMode::One,
            shuffle: ShuffleMode::Off,
        };
        store.save_modes(&modes).unwrap();
        assert_eq!(store.load_modes().unwrap(), modes);
    }

    #[test]
    fn corrupt_store_reports_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modes.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonSettingsStore::new(path);
        assert!(matches!(
            store.load_modes(),
            Err(PlaybackError::Serialization(_))
        ));
    }
}
