//! Configuration management for anotanusa.
//!
//! Configuration can be set via environment variables:
//! - `ANOTANUSA_DATA_DIR` - Optional. Directory holding task documents. Defaults to `./data`.
//! - `MIN_TEXT_LENGTH` - Optional. Minimum trimmed length of a generation answer. Defaults to `3`.
//! - `CLASSIFICATION_SAVE_DELAY_MS` - Optional. Auto-save delay for classification edits. Defaults to `0` (save on navigation only).
//! - `GENERATION_SAVE_DELAY_MS` - Optional. Auto-save delay for generation edits. Defaults to `3000`.
//! - `RANKING_SAVE_DELAY_MS` - Optional. Auto-save delay for ranking edits. Defaults to `2000`.
//! - `EXPORT_FORMAT` - Optional. `csv` or `json`. Defaults to `json`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::export::ExportFormat;
use crate::model::{AnswerRules, TaskType, DEFAULT_MIN_TEXT_LENGTH};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Per-tracker behaviour: validity thresholds and auto-save delays.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub rules: AnswerRules,

    /// Zero disables auto-save; edits are then saved on navigation or completion.
    pub classification_save_delay: Duration,

    pub generation_save_delay: Duration,

    pub ranking_save_delay: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            rules: AnswerRules::default(),
            classification_save_delay: Duration::ZERO,
            generation_save_delay: Duration::from_millis(3000),
            ranking_save_delay: Duration::from_millis(2000),
        }
    }
}

impl TrackerConfig {
    /// Debounce delay for edits to a task of this type.
    pub fn save_delay(&self, task_type: TaskType) -> Duration {
        match task_type {
            TaskType::Classification => self.classification_save_delay,
            TaskType::Generation => self.generation_save_delay,
            TaskType::Ranking => self.ranking_save_delay,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory of task documents
    pub data_dir: PathBuf,

    /// Tracker behaviour
    pub tracker: TrackerConfig,

    /// Default export format for the reporting binary
    pub export_format: ExportFormat,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric or format variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = std::env::var("ANOTANUSA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let min_text_length = env_parse("MIN_TEXT_LENGTH")?.unwrap_or(DEFAULT_MIN_TEXT_LENGTH);

        let defaults = TrackerConfig::default();
        let tracker = TrackerConfig {
            rules: AnswerRules { min_text_length },
            classification_save_delay: env_millis("CLASSIFICATION_SAVE_DELAY_MS")?
                .unwrap_or(defaults.classification_save_delay),
            generation_save_delay: env_millis("GENERATION_SAVE_DELAY_MS")?
                .unwrap_or(defaults.generation_save_delay),
            ranking_save_delay: env_millis("RANKING_SAVE_DELAY_MS")?
                .unwrap_or(defaults.ranking_save_delay),
        };

        let export_format = std::env::var("EXPORT_FORMAT")
            .ok()
            .map(|v| {
                v.parse::<ExportFormat>()
                    .map_err(|e| ConfigError::InvalidValue("EXPORT_FORMAT".to_string(), e))
            })
            .transpose()?
            .unwrap_or(ExportFormat::Json);

        Ok(Self {
            data_dir,
            tracker,
            export_format,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            tracker: TrackerConfig::default(),
            export_format: ExportFormat::Json,
        }
    }
}

fn env_parse<T>(name: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(name)
        .ok()
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e)))
        })
        .transpose()
}

fn env_millis(name: &str) -> Result<Option<Duration>, ConfigError> {
    Ok(env_parse::<u64>(name)?.map(Duration::from_millis))
}
