//! # prunelog
//!
//! Loggers that record training metrics of pruned networks.
//!
//! ## Overview
//!
//! prunelog provides:
//! - A `DataLogger` trait covering training progress, activation statistics,
//!   weight sparsity, filter magnitudes, weight distributions and model buffers
//! - `ScalarHistogramLogger` writing TensorBoard scalars and histograms
//! - `TextLogger` writing sparsity tables and progress lines through `tracing`
//! - `TabularLogger` writing sparsity statistics and buffers as CSV
//!
//! ## Features
//!
//! - `default` - Includes `tensorboard`
//! - `tensorboard` - Event-file sink backed by `tensorboard-rs`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use prunelog::prelude::*;
//!
//! let config = LoggerConfig::new("./logs");
//! let mut loggers = CompositeLogger::new(vec![
//!     Box::new(ScalarHistogramLogger::tensorboard(&config)?),
//!     Box::new(TextLogger::new()),
//!     Box::new(TabularLogger::new(&config)),
//! ]);
//!
//! let stats = StatsRecord::new("Performance/Training/").with("Loss", 0.42);
//! loggers.log_training_progress(&stats, Progress::new(epoch, step, steps_per_epoch))?;
//! loggers.log_weights_sparsity(&model, epoch)?;
//! ```

pub mod config;
pub mod histogram;
pub mod log;
pub mod model;
pub mod sink;
pub mod stats;
pub mod table;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::LoggerConfig;
    pub use crate::log::{
        CompositeLogger, DataLogger, MetricValue, Progress, ScalarHistogramLogger, StatsRecord,
        TabularLogger, TextLogger,
    };
    pub use crate::model::{Module, Parameter};
    #[cfg(feature = "tensorboard")]
    pub use crate::sink::EventFileSink;
    pub use crate::sink::{MemorySink, SummarySink};
    pub use crate::{PruneLogError, Result};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum PruneLogError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, PruneLogError>;
