//! Store configuration loaded from `config.toml`.
//!
//! Lookup order for the file is `$CONTENT_MEMORY_CONFIG_PATH`, then
//! `<data dir>/config.toml`. A missing file means defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MAX_RECORDS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Explicit database file; falls back to `<data dir>/memory.sqlite`
    pub database_path: Option<PathBuf>,
    /// Hard cap on retained feedback events
    pub max_records: usize,
    pub enabled: bool,
    pub thresholds: MiningThresholds,
    pub learning: LearningConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            max_records: DEFAULT_MAX_RECORDS,
            enabled: true,
            thresholds: MiningThresholds::default(),
            learning: LearningConfig::default(),
        }
    }
}

/// Fixed thresholds used by the edit pattern miner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningThresholds {
    /// Word count delta above which a length pattern is emitted
    pub length_delta_words: usize,
    /// Added/removed word count above which a vocabulary pattern is emitted
    pub vocabulary_min_words: usize,
    /// Cap on stored examples per pattern and on example words per observation
    pub max_examples: usize,
    /// Granularity used to describe the approximate length delta. Deltas are
    /// rounded to the nearest bucket and never below one bucket, so with the
    /// default of 10 a 6 word change reads "approximately 10 words".
    pub length_bucket_words: usize,
}

impl Default for MiningThresholds {
    fn default() -> Self {
        Self {
            length_delta_words: 5,
            vocabulary_min_words: 3,
            max_examples: 10,
            length_bucket_words: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub initial_confidence: f64,
    pub confidence_step: f64,
    pub max_confidence: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            initial_confidence: 0.3,
            confidence_step: 0.1,
            max_confidence: 1.0,
        }
    }
}

pub fn load_config() -> StoreConfig {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &std::path::Path) -> StoreConfig {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return StoreConfig::default();
    };
    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(err) => {
            log::warn!(
                "Ignoring malformed config at {}: {}",
                path.display(),
                err
            );
            StoreConfig::default()
        }
    }
}

/// Resolve the database location: env override, then config, then data dir.
pub fn database_path(config: &StoreConfig) -> PathBuf {
    if let Ok(path) = std::env::var("CONTENT_MEMORY_DB_PATH") {
        return PathBuf::from(path);
    }
    if let Some(path) = &config.database_path {
        return path.clone();
    }
    app_data_dir().join("memory.sqlite")
}

fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("CONTENT_MEMORY_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    app_data_dir().join("config.toml")
}

fn app_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var("CONTENT_MEMORY_DATA_HOME") {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = home::home_dir() {
            return home
                .join("Library")
                .join("Application Support")
                .join("ContentMemory");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("ContentMemory");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("content-memory");
        }
        if let Some(home) = home::home_dir() {
            return home.join(".local").join("share").join("content-memory");
        }
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".content-memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let config = StoreConfig::default();
        assert_eq!(config.max_records, 2000);
        assert!(config.enabled);
        assert_eq!(config.thresholds.length_delta_words, 5);
        assert_eq!(config.thresholds.vocabulary_min_words, 3);
        assert_eq!(config.thresholds.max_examples, 10);
        assert_eq!(config.learning.initial_confidence, 0.3);
        assert_eq!(config.learning.confidence_step, 0.1);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: StoreConfig = toml::from_str(
            r#"
            max_records = 50

            [thresholds]
            vocabulary_min_words = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.max_records, 50);
        assert_eq!(config.thresholds.vocabulary_min_words, 8);
        assert_eq!(config.thresholds.length_delta_words, 5);
        assert_eq!(config.learning.max_confidence, 1.0);
    }

    #[test]
    fn missing_or_malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert_eq!(load_config_from(&missing), StoreConfig::default());

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "max_records = \"lots\"").unwrap();
        assert_eq!(load_config_from(&broken), StoreConfig::default());
    }
}
