//! CSV logging backend.

use super::{DataLogger, Progress};
use crate::config::LoggerConfig;
use crate::model::{normalize_module_name, Module};
use crate::stats::{weights_sparsity, SPARSITY_RANKS};
use crate::Result;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const SPARSITY_HEADER: [&str; 5] = [
    "parameter",
    "shape",
    "volume",
    "sparse volume",
    "sparsity level",
];

const BUFFER_HEADER: [&str; 5] = ["Layer", "Epoch", "Step", "Total", "Values"];

/// Logger that writes statistics as CSV files under a log directory.
///
/// Files are opened and closed within each call.
#[derive(Clone, Debug)]
pub struct TabularLogger {
    logdir: PathBuf,
    fname_prefix: String,
}

impl TabularLogger {
    pub fn new(config: &LoggerConfig) -> Self {
        Self {
            logdir: config.csv_dir(),
            fname_prefix: config.fname_prefix.clone(),
        }
    }

    /// Path of the CSV file for `postfix`: `<logdir>/<prefix>_<postfix>.csv`.
    pub fn get_fname(&self, postfix: &str) -> PathBuf {
        let fname = if self.fname_prefix.is_empty() {
            format!("{}.csv", postfix)
        } else {
            format!("{}_{}.csv", self.fname_prefix, postfix)
        };
        self.logdir.join(fname)
    }

    pub fn logdir(&self) -> &Path {
        &self.logdir
    }
}

/// Write the per-tensor sparsity table of `model` to `out`.
pub fn write_weights_sparsity<W: Write>(out: W, model: &Module) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer.write_record(SPARSITY_HEADER)?;

    for record in weights_sparsity(model, SPARSITY_RANKS).records {
        writer.serialize((
            record.name,
            record.shape,
            record.numel,
            record.nnz,
            record.sparsity,
        ))?;
    }
    writer.flush()?;
    Ok(())
}

impl DataLogger for TabularLogger {
    fn log_weights_sparsity(&mut self, model: &Module, _epoch: u64) -> Result<()> {
        let path = self.get_fname("weights_sparsity");
        write_weights_sparsity(File::create(&path)?, model)?;
        tracing::debug!(path = %path.display(), "Wrote weights sparsity");
        Ok(())
    }

    fn log_model_buffers(
        &mut self,
        model: &Module,
        buffer_names: &[&str],
        _tag_prefix: &str,
        progress: Progress,
    ) -> Result<()> {
        let modules = model.named_modules();
        let epoch = progress
            .epoch
            .map_or_else(|| "-".to_string(), |e| e.to_string());

        for buffer_name in buffer_names {
            let path = self.get_fname(buffer_name);
            let is_new = !path.exists();
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_writer(file);
            if is_new {
                writer.write_record(BUFFER_HEADER)?;
            }

            for (module_name, module) in &modules {
                let Some(buffer) = module.local_tensor(buffer_name) else {
                    continue;
                };
                let layer = match normalize_module_name(module_name) {
                    name if name.is_empty() => buffer_name.to_string(),
                    name => format!("{}.{}", name, buffer_name),
                };
                let mut row = vec![
                    layer,
                    epoch.clone(),
                    progress.completed.to_string(),
                    progress.total.to_string(),
                ];
                row.extend(buffer.iter().map(|v| v.to_string()));
                writer.write_record(&row)?;
            }
            writer.flush()?;
        }
        Ok(())
    }
}
