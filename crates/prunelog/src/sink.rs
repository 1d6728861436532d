//! Destinations for scalar and histogram summaries.

use crate::histogram::Histogram;
#[cfg(feature = "tensorboard")]
use crate::Result;
#[cfg(feature = "tensorboard")]
use std::collections::HashMap;
#[cfg(feature = "tensorboard")]
use std::fs;
#[cfg(feature = "tensorboard")]
use std::path::{Path, PathBuf};
#[cfg(feature = "tensorboard")]
use tensorboard_rs::summary_writer::SummaryWriter;

/// Append-only writer of keyed summaries, the write side of a visualization log.
pub trait SummarySink: Send {
    /// Append one scalar point.
    fn add_scalar(&mut self, tag: &str, value: f32, step: u64);

    /// Append several values that belong on the same graph.
    fn add_scalars(&mut self, main_tag: &str, values: &[f32], step: u64);

    /// Append a distribution.
    fn add_histogram(&mut self, tag: &str, histogram: &Histogram, step: u64);

    /// Push buffered records to their destination.
    fn flush(&mut self) {}
}

/// A summary captured by [`MemorySink`].
#[derive(Clone, Debug, PartialEq)]
pub enum SummaryEvent {
    Scalar {
        tag: String,
        value: f32,
        step: u64,
    },
    Scalars {
        main_tag: String,
        values: Vec<f32>,
        step: u64,
    },
    Histogram {
        tag: String,
        histogram: Histogram,
        step: u64,
    },
}

impl SummaryEvent {
    pub fn tag(&self) -> &str {
        match self {
            SummaryEvent::Scalar { tag, .. } => tag,
            SummaryEvent::Scalars { main_tag, .. } => main_tag,
            SummaryEvent::Histogram { tag, .. } => tag,
        }
    }

    pub fn step(&self) -> u64 {
        match self {
            SummaryEvent::Scalar { step, .. }
            | SummaryEvent::Scalars { step, .. }
            | SummaryEvent::Histogram { step, .. } => *step,
        }
    }
}

/// Sink that keeps every summary in memory, in write order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Vec<SummaryEvent>,
    flushes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SummaryEvent] {
        &self.events
    }

    /// Value of the last scalar written under `tag`.
    pub fn scalar(&self, tag: &str) -> Option<f32> {
        self.events.iter().rev().find_map(|e| match e {
            SummaryEvent::Scalar { tag: t, value, .. } if t == tag => Some(*value),
            _ => None,
        })
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl SummarySink for MemorySink {
    fn add_scalar(&mut self, tag: &str, value: f32, step: u64) {
        self.events.push(SummaryEvent::Scalar {
            tag: tag.to_string(),
            value,
            step,
        });
    }

    fn add_scalars(&mut self, main_tag: &str, values: &[f32], step: u64) {
        self.events.push(SummaryEvent::Scalars {
            main_tag: main_tag.to_string(),
            values: values.to_vec(),
            step,
        });
    }

    fn add_histogram(&mut self, tag: &str, histogram: &Histogram, step: u64) {
        self.events.push(SummaryEvent::Histogram {
            tag: tag.to_string(),
            histogram: histogram.clone(),
            step,
        });
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}

/// Sink that writes TensorBoard event files.
#[cfg(feature = "tensorboard")]
pub struct EventFileSink {
    writer: SummaryWriter,
    log_dir: PathBuf,
}

#[cfg(feature = "tensorboard")]
impl EventFileSink {
    /// Open an event file in `log_dir`, creating the directory if needed.
    pub fn new(log_dir: impl AsRef<Path>) -> Result<Self> {
        let log_dir = log_dir.as_ref().to_path_buf();
        // The writer panics when it cannot create the directory itself
        fs::create_dir_all(&log_dir)?;
        Ok(Self {
            writer: SummaryWriter::new(&log_dir),
            log_dir,
        })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

#[cfg(feature = "tensorboard")]
impl std::fmt::Debug for EventFileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFileSink")
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

#[cfg(feature = "tensorboard")]
impl SummarySink for EventFileSink {
    fn add_scalar(&mut self, tag: &str, value: f32, step: u64) {
        self.writer.add_scalar(tag, value, step as usize);
    }

    fn add_scalars(&mut self, main_tag: &str, values: &[f32], step: u64) {
        // One sub-run per position so all values share a chart
        let tag_scalar: HashMap<String, f32> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), *v))
            .collect();
        self.writer.add_scalars(main_tag, &tag_scalar, step as usize);
    }

    fn add_histogram(&mut self, tag: &str, histogram: &Histogram, step: u64) {
        self.writer.add_histogram_raw(
            tag,
            histogram.min,
            histogram.max,
            histogram.num,
            histogram.sum,
            histogram.sum_squares,
            &histogram.bucket_limits,
            &histogram.bucket_counts,
            step as usize,
        );
    }

    fn flush(&mut self) {
        self.writer.flush();
    }
}
