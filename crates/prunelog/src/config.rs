//! Logger configuration.

use crate::{PruneLogError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Static settings shared by the loggers. Fixed once a logger is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Output directory. TensorBoard falls back to `runs/<time><comment>` when unset.
    pub logdir: Option<PathBuf>,
    /// Suffix appended to the default TensorBoard run directory
    pub comment: String,
    /// Prefix of CSV file names
    pub fname_prefix: String,
    /// Parameter-name substrings that get weight histograms
    pub logged_params: Vec<String>,
    /// Also write gradient histograms
    pub log_gradients: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            logdir: None,
            comment: String::new(),
            fname_prefix: String::new(),
            logged_params: vec!["weight".to_string()],
            log_gradients: false,
        }
    }
}

impl LoggerConfig {
    /// Create a new config writing into `logdir`.
    pub fn new(logdir: impl Into<PathBuf>) -> Self {
        Self {
            logdir: Some(logdir.into()),
            ..Default::default()
        }
    }

    /// Set the run comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Set the CSV file-name prefix.
    pub fn fname_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.fname_prefix = prefix.into();
        self
    }

    /// Replace the histogram name filter.
    pub fn logged_params<I, S>(mut self, substrings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.logged_params = substrings.into_iter().map(Into::into).collect();
        self
    }

    /// Enable/disable gradient histograms.
    pub fn log_gradients(mut self, enabled: bool) -> Self {
        self.log_gradients = enabled;
        self
    }

    /// Load from a `.json` or `.toml` file (TOML when there is no extension).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config: LoggerConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            Some("toml") | None => toml::from_str(&contents)?,
            Some(other) => {
                return Err(PruneLogError::ConfigError(format!(
                    "unsupported configuration extension '{}'",
                    other
                )));
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.logged_params.is_empty() {
            return Err(PruneLogError::ConfigError(
                "logged_params must not be empty".to_string(),
            ));
        }
        if self.logged_params.iter().any(|s| s.is_empty()) {
            return Err(PruneLogError::ConfigError(
                "logged_params entries must not be empty strings".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory for TensorBoard event files.
    pub fn tensorboard_dir(&self) -> PathBuf {
        match &self.logdir {
            Some(dir) => dir.clone(),
            None => {
                let secs = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                PathBuf::from("runs").join(format!("{}{}", secs, self.comment))
            }
        }
    }

    /// Directory for CSV files; the working directory when unset.
    pub fn csv_dir(&self) -> PathBuf {
        self.logdir.clone().unwrap_or_default()
    }
}
