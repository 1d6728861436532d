//! Training-metric loggers.
//!
//! Provides:
//! - `DataLogger` trait, the capability set every backend implements a part of
//! - `ScalarHistogramLogger` for TensorBoard scalars and histograms
//! - `TextLogger` for human-readable summaries through `tracing`
//! - `TabularLogger` for CSV files
//! - `CompositeLogger` for multi-backend logging

mod logger;
mod tabular;
mod tensorboard;
mod text;

pub use logger::{CompositeLogger, DataLogger, MetricValue, Progress, StatsRecord};
pub use tabular::{write_weights_sparsity, TabularLogger};
pub use tensorboard::ScalarHistogramLogger;
pub use text::TextLogger;
