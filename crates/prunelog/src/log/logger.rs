//! Data logger trait, shared record types and the composite logger.

use crate::model::{Module, Parameter};
use crate::Result;

/// Position of the training loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// `None` outside of training (evaluation/test passes)
    pub epoch: Option<u64>,
    /// Steps completed within the epoch
    pub completed: u64,
    /// Steps per epoch
    pub total: u64,
}

impl Progress {
    pub fn new(epoch: u64, completed: u64, total: u64) -> Self {
        Self {
            epoch: Some(epoch),
            completed,
            total,
        }
    }

    /// Progress of an evaluation pass.
    pub fn test(completed: u64, total: u64) -> Self {
        Self {
            epoch: None,
            completed,
            total,
        }
    }

    /// Monotonic step counter across epochs: `total * epoch + completed`.
    pub fn global_step(&self) -> u64 {
        self.total * self.epoch.unwrap_or(0) + self.completed
    }
}

/// A reported metric value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            MetricValue::Int(v) => v as f64,
            MetricValue::Float(v) => v,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<f32> for MetricValue {
    fn from(v: f32) -> Self {
        MetricValue::Float(f64::from(v))
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

impl From<i32> for MetricValue {
    fn from(v: i32) -> Self {
        MetricValue::Int(i64::from(v))
    }
}

impl From<u32> for MetricValue {
    fn from(v: u32) -> Self {
        MetricValue::Int(i64::from(v))
    }
}

/// Metrics reported together under a common tag prefix.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatsRecord {
    pub prefix: String,
    /// Metric name and value, in report order
    pub values: Vec<(String, MetricValue)>,
}

impl StatsRecord {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            values: Vec::new(),
        }
    }

    /// Add a metric (builder style).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<MetricValue>) {
        self.values.push((name.into(), value.into()));
    }
}

/// Capability set of a training-metrics logger.
///
/// Every method defaults to a no-op, so a backend only implements what it
/// can represent. Loggers read the model and never modify it.
pub trait DataLogger: Send {
    /// Log per-step training metrics.
    fn log_training_progress(&mut self, _stats: &StatsRecord, _progress: Progress) -> Result<()> {
        Ok(())
    }

    /// Log one statistic per layer for an activation-collection phase.
    fn log_activation_statistic(
        &mut self,
        _phase: &str,
        _stat_name: &str,
        _activation_stats: &[(String, f64)],
        _epoch: u64,
    ) -> Result<()> {
        Ok(())
    }

    /// Log the sparsity of every rank-2/3/4 weight tensor.
    fn log_weights_sparsity(&mut self, _model: &Module, _epoch: u64) -> Result<()> {
        Ok(())
    }

    /// Log the L1 magnitude of convolution filters.
    fn log_weights_filter_magnitude(&mut self, _model: &Module, _epoch: u64) -> Result<()> {
        Ok(())
    }

    /// Log value distributions of the given parameters.
    fn log_weights_distribution(
        &mut self,
        _named_params: Option<&[(String, &Parameter)]>,
        _steps_completed: u64,
    ) -> Result<()> {
        Ok(())
    }

    /// Log the values of named buffers, per module.
    fn log_model_buffers(
        &mut self,
        _model: &Module,
        _buffer_names: &[&str],
        _tag_prefix: &str,
        _progress: Progress,
    ) -> Result<()> {
        Ok(())
    }

    /// Flush pending writes.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A composite logger that dispatches to multiple backends.
///
/// Backends are called in insertion order; the first error stops dispatch
/// and is returned.
#[derive(Default)]
pub struct CompositeLogger {
    loggers: Vec<Box<dyn DataLogger>>,
}

impl CompositeLogger {
    pub fn new(loggers: Vec<Box<dyn DataLogger>>) -> Self {
        Self { loggers }
    }

    pub fn add(&mut self, logger: Box<dyn DataLogger>) {
        self.loggers.push(logger);
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}

impl DataLogger for CompositeLogger {
    fn log_training_progress(&mut self, stats: &StatsRecord, progress: Progress) -> Result<()> {
        for logger in &mut self.loggers {
            logger.log_training_progress(stats, progress)?;
        }
        Ok(())
    }

    fn log_activation_statistic(
        &mut self,
        phase: &str,
        stat_name: &str,
        activation_stats: &[(String, f64)],
        epoch: u64,
    ) -> Result<()> {
        for logger in &mut self.loggers {
            logger.log_activation_statistic(phase, stat_name, activation_stats, epoch)?;
        }
        Ok(())
    }

    fn log_weights_sparsity(&mut self, model: &Module, epoch: u64) -> Result<()> {
        for logger in &mut self.loggers {
            logger.log_weights_sparsity(model, epoch)?;
        }
        Ok(())
    }

    fn log_weights_filter_magnitude(&mut self, model: &Module, epoch: u64) -> Result<()> {
        for logger in &mut self.loggers {
            logger.log_weights_filter_magnitude(model, epoch)?;
        }
        Ok(())
    }

    fn log_weights_distribution(
        &mut self,
        named_params: Option<&[(String, &Parameter)]>,
        steps_completed: u64,
    ) -> Result<()> {
        for logger in &mut self.loggers {
            logger.log_weights_distribution(named_params, steps_completed)?;
        }
        Ok(())
    }

    fn log_model_buffers(
        &mut self,
        model: &Module,
        buffer_names: &[&str],
        tag_prefix: &str,
        progress: Progress,
    ) -> Result<()> {
        for logger in &mut self.loggers {
            logger.log_model_buffers(model, buffer_names, tag_prefix, progress)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        for logger in &mut self.loggers {
            logger.flush()?;
        }
        Ok(())
    }
}
