//! Text logging backend.

use super::{DataLogger, MetricValue, Progress, StatsRecord};
use crate::model::{normalize_module_name, Module};
use crate::stats::{weights_sparsity_table, SPARSITY_RANKS};
use crate::table::{Cell, Table, TableStyle};
use crate::utils::pretty_int;
use crate::Result;
use std::fmt::Write;

/// Logger that writes human-readable summaries through `tracing`.
pub struct TextLogger;

impl Default for TextLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLogger {
    pub fn new() -> Self {
        Self
    }
}

impl DataLogger for TextLogger {
    fn log_training_progress(&mut self, stats: &StatsRecord, progress: Progress) -> Result<()> {
        let mut line = match progress.epoch {
            Some(epoch) => format!(
                "Epoch: [{}][{:5}/{:5}]    ",
                epoch, progress.completed, progress.total
            ),
            None => format!("Test: [{:5}/{:5}]    ", progress.completed, progress.total),
        };
        for (name, value) in &stats.values {
            // Writing into a String cannot fail
            let _ = match value {
                MetricValue::Int(v) => write!(line, "{} {}    ", name, pretty_int(*v)),
                MetricValue::Float(v) => write!(line, "{} {:.6}    ", name, v),
            };
        }
        tracing::info!("{}", line);
        Ok(())
    }

    fn log_activation_statistic(
        &mut self,
        _phase: &str,
        stat_name: &str,
        activation_stats: &[(String, f64)],
        _epoch: u64,
    ) -> Result<()> {
        let mut table = Table::new(&["Layer", stat_name], TableStyle::Psql, 2);
        for (layer, value) in activation_stats {
            table.push(vec![Cell::text(layer.as_str()), Cell::Float(*value)]);
        }
        tracing::info!("\n{}", table.render());
        Ok(())
    }

    fn log_weights_sparsity(&mut self, model: &Module, _epoch: u64) -> Result<()> {
        let (table, total) = weights_sparsity_table(model, SPARSITY_RANKS);
        tracing::info!("\nParameters:\n{}", table);
        match total {
            Some(total) => tracing::info!("Total sparsity: {:.2}\n", total),
            None => tracing::info!("Total sparsity: n/a\n"),
        }
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

        // One table per buffer, one column per value
        for buffer_name in buffer_names {
            let mut rows = Vec::new();
            let mut max_len = 0;
            for (module_name, module) in &modules {
                let Some(buffer) = module.local_tensor(buffer_name) else {
                    continue;
                };
                let layer = match normalize_module_name(module_name) {
                    name if name.is_empty() => buffer_name.to_string(),
                    name => format!("{}.{}", name, buffer_name),
                };
                let mut row = vec![Cell::Text(layer)];
                row.extend(buffer.iter().map(|v| Cell::Float(f64::from(*v))));
                max_len = max_len.max(buffer.len());
                rows.push(row);
            }
            if rows.is_empty() {
                continue;
            }

            let mut headers = vec!["Layer".to_string()];
            headers.extend((0..max_len).map(|i| format!("Val_{}", i)));
            let mut table = Table::new(&headers, TableStyle::Psql, 4);
            for row in rows {
                table.push(row);
            }
            tracing::info!(
                "\n{}: (Epoch {}, Step {})\n{}",
                buffer_name.to_uppercase(),
                epoch,
                progress.completed,
                table.render()
            );
        }
        Ok(())
    }
}
