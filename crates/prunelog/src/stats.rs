//! Sparsity and magnitude statistics over weight tensors.

use crate::model::Module;
use crate::table::{Cell, Table, TableStyle};
use ndarray::{ArrayD, Axis};

/// Tensor ranks that carry prunable weights (fully-connected, 1D conv, 2D conv).
pub const SPARSITY_RANKS: &[usize] = &[2, 3, 4];

/// Fraction of non-zero elements. An empty tensor has density 0.
pub fn density(t: &ArrayD<f32>) -> f64 {
    let numel = t.len();
    if numel == 0 {
        return 0.0;
    }
    count_nonzero(t) as f64 / numel as f64
}

/// Fraction of zero elements.
pub fn sparsity(t: &ArrayD<f32>) -> f64 {
    1.0 - density(t)
}

/// Fraction of all-zero 2D structures.
///
/// A rank-4 tensor `(F, C, K1, K2)` is viewed as `F*C` kernels of `K1*K2`
/// values; a rank-2 tensor contributes its rows. Other ranks report 0.
pub fn sparsity_2d(t: &ArrayD<f32>) -> f64 {
    let shape = t.shape();
    let (rows, row_len) = match shape.len() {
        4 => (shape[0] * shape[1], shape[2] * shape[3]),
        2 => (shape[0], shape[1]),
        _ => return 0.0,
    };
    let flat: Vec<f32> = t.iter().copied().collect();
    zero_row_fraction(&flat, rows, row_len)
}

/// Fraction of all-zero filters (dim 0) of a rank-4 tensor.
pub fn sparsity_3d(t: &ArrayD<f32>) -> f64 {
    if t.ndim() != 4 {
        return 0.0;
    }
    zero_slice_fraction(t, 0)
}

/// Fraction of all-zero input channels (dim 1) of a rank-4 tensor.
pub fn sparsity_ch(t: &ArrayD<f32>) -> f64 {
    if t.ndim() != 4 {
        return 0.0;
    }
    zero_slice_fraction(t, 1)
}

/// Fraction of all-zero rows of a rank-2 tensor.
pub fn sparsity_rows(t: &ArrayD<f32>) -> f64 {
    if t.ndim() != 2 {
        return 0.0;
    }
    zero_slice_fraction(t, 0)
}

/// Fraction of all-zero columns of a rank-2 tensor.
pub fn sparsity_cols(t: &ArrayD<f32>) -> f64 {
    if t.ndim() != 2 {
        return 0.0;
    }
    zero_slice_fraction(t, 1)
}

/// L1 norm of every filter of a rank-4 tensor. Other ranks yield nothing.
pub fn norm_filters(t: &ArrayD<f32>) -> Vec<f32> {
    if t.ndim() != 4 {
        return Vec::new();
    }
    t.axis_iter(Axis(0))
        .map(|filter| filter.iter().map(|v| v.abs()).sum())
        .collect()
}

/// Human-readable shape, e.g. `64x3x7x7`.
pub fn size_to_str(shape: &[usize]) -> String {
    shape
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("x")
}

fn count_nonzero(t: &ArrayD<f32>) -> usize {
    t.iter().filter(|&&v| v != 0.0).count()
}

fn zero_row_fraction(flat: &[f32], rows: usize, row_len: usize) -> f64 {
    if rows == 0 || row_len == 0 {
        return 0.0;
    }
    let zero_rows = flat
        .chunks(row_len)
        .filter(|row| row.iter().all(|&v| v == 0.0))
        .count();
    zero_rows as f64 / rows as f64
}

fn zero_slice_fraction(t: &ArrayD<f32>, axis: usize) -> f64 {
    let n = t.len_of(Axis(axis));
    if n == 0 {
        return 0.0;
    }
    let zero = t
        .axis_iter(Axis(axis))
        .filter(|slice| slice.iter().all(|&v| v == 0.0))
        .count();
    zero as f64 / n as f64
}

/// Sparsity of a single tensor, computed from its current values.
#[derive(Clone, Debug, PartialEq)]
pub struct SparsityRecord {
    pub name: String,
    /// Shape as produced by [`size_to_str`]
    pub shape: String,
    /// Number of elements
    pub numel: usize,
    /// Number of non-zero elements
    pub nnz: usize,
    pub density: f64,
    /// Percentage of zero elements
    pub sparsity: f64,
}

impl SparsityRecord {
    pub fn from_tensor(name: &str, t: &ArrayD<f32>) -> Self {
        let density = density(t);
        Self {
            name: name.to_string(),
            shape: size_to_str(t.shape()),
            numel: t.len(),
            nnz: count_nonzero(t),
            density,
            sparsity: (1.0 - density) * 100.0,
        }
    }
}

/// Per-tensor records plus running totals over a model.
#[derive(Clone, Debug, Default)]
pub struct SparsityReport {
    pub records: Vec<SparsityRecord>,
    /// Total elements over all recorded tensors
    pub params_size: usize,
    /// Total non-zero elements over all recorded tensors
    pub sparse_params_size: usize,
}

impl SparsityReport {
    /// Overall sparsity percentage, or `None` when no tensor was recorded.
    pub fn total_sparsity(&self) -> Option<f64> {
        if self.params_size == 0 {
            return None;
        }
        Some(100.0 * (1.0 - self.sparse_params_size as f64 / self.params_size as f64))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a record and update the totals.
    pub fn push(&mut self, record: SparsityRecord) {
        self.params_size += record.numel;
        self.sparse_params_size += record.nnz;
        self.records.push(record);
    }
}

/// Collect a [`SparsityRecord`] for every state tensor whose rank is in `ranks`.
pub fn weights_sparsity(model: &Module, ranks: &[usize]) -> SparsityReport {
    let mut report = SparsityReport::default();
    for (name, t) in model.state_dict() {
        if !ranks.contains(&t.ndim()) {
            continue;
        }
        report.push(SparsityRecord::from_tensor(&name, t));
    }
    report
}

/// Name fragments of the tensors listed in the summary table.
const SUMMARY_TENSORS: [&str; 2] = ["weight", "bias"];

/// Summary table of structured and fine-grained sparsity.
///
/// Only tensors whose name contains `weight` or `bias` are listed. Returns
/// the rendered table together with the total sparsity percentage over the
/// listed tensors (`None` when nothing was listed).
pub fn weights_sparsity_table(model: &Module, ranks: &[usize]) -> (String, Option<f64>) {
    let mut table = Table::new(
        &[
            "Name",
            "Shape",
            "NNZ (dense)",
            "NNZ (sparse)",
            "Cols (%)",
            "Rows (%)",
            "Ch (%)",
            "2D (%)",
            "3D (%)",
            "Fine (%)",
            "Std",
            "Mean",
            "Abs-Mean",
        ],
        TableStyle::Pipe,
        5,
    );

    let mut params_size = 0usize;
    let mut sparse_params_size = 0usize;

    for (name, t) in model.state_dict() {
        if !ranks.contains(&t.ndim()) || !SUMMARY_TENSORS.iter().any(|k| name.contains(k)) {
            continue;
        }
        let nnz = count_nonzero(t);
        params_size += t.len();
        sparse_params_size += nnz;

        let (std_dev, mean, abs_mean) = moments(t);
        table.push(vec![
            Cell::text(name),
            Cell::text(size_to_str(t.shape())),
            Cell::Int(t.len() as i64),
            Cell::Int(nnz as i64),
            Cell::Float(sparsity_cols(t) * 100.0),
            Cell::Float(sparsity_rows(t) * 100.0),
            Cell::Float(sparsity_ch(t) * 100.0),
            Cell::Float(sparsity_2d(t) * 100.0),
            Cell::Float(sparsity_3d(t) * 100.0),
            Cell::Float(sparsity(t) * 100.0),
            Cell::Float(std_dev),
            Cell::Float(mean),
            Cell::Float(abs_mean),
        ]);
    }

    let total = SparsityReport {
        records: Vec::new(),
        params_size,
        sparse_params_size,
    }
    .total_sparsity();

    let mut total_row = vec![
        Cell::text("Total sparsity:"),
        Cell::text("-"),
        Cell::Int(params_size as i64),
        Cell::Int(sparse_params_size as i64),
    ];
    total_row.extend(std::iter::repeat(Cell::Float(0.0)).take(5));
    total_row.push(total.map_or_else(|| Cell::text("-"), Cell::Float));
    total_row.extend(std::iter::repeat(Cell::Float(0.0)).take(3));
    table.push(total_row);

    (table.render(), total)
}

/// Sample standard deviation, mean and mean absolute value.
fn moments(t: &ArrayD<f32>) -> (f64, f64, f64) {
    let n = t.len();
    if n == 0 {
        return (0.0, 0.0, 0.0);
    }
    let mean = t.iter().map(|&v| f64::from(v)).sum::<f64>() / n as f64;
    let abs_mean = t.iter().map(|&v| f64::from(v).abs()).sum::<f64>() / n as f64;
    let std_dev = if n > 1 {
        let var = t
            .iter()
            .map(|&v| (f64::from(v) - mean).powi(2))
            .sum::<f64>()
            / (n - 1) as f64;
        var.sqrt()
    } else {
        0.0
    };
    (std_dev, mean, abs_mean)
}
