//! Histogram summaries in TensorBoard's bucket layout.

use std::sync::OnceLock;

/// Bucketed distribution of a set of values.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub num: f64,
    pub sum: f64,
    pub sum_squares: f64,
    /// Upper edge of each bucket
    pub bucket_limits: Vec<f64>,
    pub bucket_counts: Vec<f64>,
}

impl Histogram {
    /// Bucket `values`. Returns `None` when there is nothing to bucket.
    ///
    /// Empty buckets before the first and after the last populated one are
    /// dropped. Non-finite values are ignored.
    pub fn from_values(values: &[f32]) -> Option<Self> {
        let limits = default_bucket_limits();
        let mut counts = vec![0.0f64; limits.len()];

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut num = 0.0;
        let mut sum = 0.0;
        let mut sum_squares = 0.0;

        for &v in values {
            let v = f64::from(v);
            if !v.is_finite() {
                continue;
            }
            // Bucket i covers [limits[i-1], limits[i])
            let idx = limits.partition_point(|&limit| limit <= v);
            counts[idx.min(limits.len() - 1)] += 1.0;
            min = min.min(v);
            max = max.max(v);
            num += 1.0;
            sum += v;
            sum_squares += v * v;
        }

        if num == 0.0 {
            return None;
        }

        let first = counts.iter().position(|&c| c > 0.0)?;
        let last = counts.iter().rposition(|&c| c > 0.0)?;

        Some(Self {
            min,
            max,
            num,
            sum,
            sum_squares,
            bucket_limits: limits[first..=last].to_vec(),
            bucket_counts: counts[first..=last].to_vec(),
        })
    }
}

/// Exponential buckets `±1e-12 * 1.1^k` up to `1e20`, zero, and `f64::MAX`.
fn default_bucket_limits() -> &'static [f64] {
    static LIMITS: OnceLock<Vec<f64>> = OnceLock::new();
    LIMITS.get_or_init(|| {
        let mut positive = Vec::new();
        let mut v = 1e-12;
        while v < 1e20 {
            positive.push(v);
            v *= 1.1;
        }
        let mut limits: Vec<f64> = positive.iter().rev().map(|v| -v).collect();
        limits.push(0.0);
        limits.extend(positive);
        limits.push(f64::MAX);
        limits
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_limits_are_sorted() {
        let limits = default_bucket_limits();
        assert!(limits.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*limits.last().unwrap(), f64::MAX);
    }

    #[test]
    fn test_summary_statistics() {
        let hist = Histogram::from_values(&[1.0, -2.0, 3.0, 0.0]).unwrap();
        assert_eq!(hist.num, 4.0);
        assert_eq!(hist.min, -2.0);
        assert_eq!(hist.max, 3.0);
        assert_relative_eq!(hist.sum, 2.0);
        assert_relative_eq!(hist.sum_squares, 14.0);
        assert_eq!(hist.bucket_counts.iter().sum::<f64>(), 4.0);
        assert_eq!(hist.bucket_limits.len(), hist.bucket_counts.len());
    }

    #[test]
    fn test_trims_empty_edges() {
        let hist = Histogram::from_values(&[0.5, 0.5]).unwrap();
        assert_eq!(hist.bucket_counts, vec![2.0]);
        assert!(hist.bucket_limits[0] >= 0.5);
    }

    #[test]
    fn test_value_on_edge_goes_to_upper_bucket() {
        let hist = Histogram::from_values(&[0.0, 0.0]).unwrap();
        assert_eq!(hist.bucket_counts, vec![2.0]);
        assert_eq!(hist.bucket_limits, vec![1e-12]);
    }

    #[test]
    fn test_empty_input() {
        assert!(Histogram::from_values(&[]).is_none());
        assert!(Histogram::from_values(&[f32::NAN]).is_none());
    }
}
