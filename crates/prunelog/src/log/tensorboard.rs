//! Scalar and histogram logging for TensorBoard.

use super::{DataLogger, Progress, StatsRecord};
use crate::config::LoggerConfig;
use crate::histogram::Histogram;
use crate::model::{Module, Parameter};
#[cfg(feature = "tensorboard")]
use crate::sink::EventFileSink;
use crate::sink::SummarySink;
use crate::stats::{self, SparsityRecord, SparsityReport, SPARSITY_RANKS};
use crate::Result;
use ndarray::ArrayD;

/// Logger that writes scalars and histograms into a [`SummarySink`].
///
/// The sink is owned for the logger's lifetime and flushed on
/// [`DataLogger::flush`]; closing it is left to the owner of the run.
pub struct ScalarHistogramLogger<S: SummarySink> {
    sink: S,
    logged_params: Vec<String>,
    log_gradients: bool,
}

#[cfg(feature = "tensorboard")]
impl ScalarHistogramLogger<EventFileSink> {
    /// Open TensorBoard event files in the configured log directory.
    ///
    /// Fails when the directory cannot be created.
    pub fn tensorboard(config: &LoggerConfig) -> Result<Self> {
        let log_dir = config.tensorboard_dir();
        tracing::info!(
            log_dir = %log_dir.display(),
            "Logging to TensorBoard - remember to execute the server: tensorboard --logdir='{}'",
            log_dir.display()
        );
        Ok(Self::new(EventFileSink::new(&log_dir)?, config))
    }
}

impl<S: SummarySink> ScalarHistogramLogger<S> {
    pub fn new(sink: S, config: &LoggerConfig) -> Self {
        Self {
            sink,
            logged_params: config.logged_params.clone(),
            log_gradients: config.log_gradients,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn is_logged(&self, tag: &str) -> bool {
        self.logged_params.iter().any(|s| tag.contains(s.as_str()))
    }

    fn write_histogram(&mut self, tag: &str, values: &ArrayD<f32>, step: u64) {
        let flat: Vec<f32> = values.iter().copied().collect();
        match Histogram::from_values(&flat) {
            Some(hist) => self.sink.add_histogram(tag, &hist, step),
            None => tracing::debug!(tag, "Skipping histogram of tensor without finite values"),
        }
    }
}

impl<S: SummarySink> DataLogger for ScalarHistogramLogger<S> {
    fn log_training_progress(&mut self, stats: &StatsRecord, progress: Progress) -> Result<()> {
        let step = progress.global_step();
        for (name, value) in &stats.values {
            let tag = format!("{}{}", stats.prefix, name.replace(' ', "_"));
            self.sink.add_scalar(&tag, value.as_f64() as f32, step);
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
        let group = format!("{}/activations/{}/", stat_name, phase);
        for (name, value) in activation_stats {
            self.sink
                .add_scalar(&format!("{}{}", group, name), *value as f32, epoch);
        }
        Ok(())
    }

    fn log_weights_sparsity(&mut self, model: &Module, epoch: u64) -> Result<()> {
        let mut report = SparsityReport::default();

        for (name, t) in model.state_dict() {
            if !SPARSITY_RANKS.contains(&t.ndim()) {
                continue;
            }
            let record = SparsityRecord::from_tensor(&name, t);
            self.sink.add_scalar(
                &format!("sparsity/weights/{}", name),
                record.sparsity as f32,
                epoch,
            );
            self.sink.add_scalar(
                &format!("sparsity-2D/weights/{}", name),
                (stats::sparsity_2d(t) * 100.0) as f32,
                epoch,
            );
            report.push(record);
        }

        match report.total_sparsity() {
            Some(total) => self
                .sink
                .add_scalar("sparsity/weights/total", total as f32, epoch),
            None => tracing::warn!(epoch, "No rank-2/3/4 weights to report total sparsity for"),
        }
        Ok(())
    }

    fn log_weights_filter_magnitude(&mut self, model: &Module, epoch: u64) -> Result<()> {
        for (name, t) in model.state_dict() {
            if t.ndim() != 4 {
                continue;
            }
            let norms = stats::norm_filters(t);
            self.sink
                .add_scalars(&format!("magnitude/filters/{}", name), &norms, epoch);
        }
        Ok(())
    }

    fn log_weights_distribution(
        &mut self,
        named_params: Option<&[(String, &Parameter)]>,
        steps_completed: u64,
    ) -> Result<()> {
        let Some(named_params) = named_params else {
            return Ok(());
        };
        for (name, param) in named_params {
            let tag = name.replace('.', "/");
            if self.is_logged(&tag) {
                self.write_histogram(&tag, &param.data, steps_completed);
            }
            // Gradients are not subject to the name filter
            if self.log_gradients {
                if let Some(grad) = &param.grad {
                    self.write_histogram(&format!("{}/grad", tag), grad, steps_completed);
                }
            }
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
        // Every value lands on one chart, which TensorBoard renders slowly
        // beyond a handful of series.
        for (module_name, module) in model.named_modules() {
            if module.has_children() {
                continue;
            }

            let values: Vec<f32> = buffer_names
                .iter()
                .filter_map(|buf| module.local_tensor(buf))
                .flat_map(|t| t.iter().copied())
                .collect();

            if !values.is_empty() {
                let tag = format!("{}/{}", tag_prefix, module_name);
                self.sink.add_scalars(&tag, &values, progress.global_step());
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.sink.flush();
        Ok(())
    }
}
