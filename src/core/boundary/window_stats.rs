//! Per-window mean and unbiased variance.
//!
//! Consecutive placements share `W - 1` rows, so statistics are served from
//! running sums built in a single pass: `O(N·D)` to build, `O(D)` per query.
//! Values are shifted by the first row before accumulating, which keeps the
//! sum-of-squares formulation from cancelling badly on large histogram counts.
//!
//! A variance within rounding distance of zero is reported as exactly zero by
//! both providers, so a column that is constant inside a window stays
//! degenerate even when its value is not exactly representable.

use super::error::{BoundaryError, BoundaryResult};
use super::sequence::OrderedSequence;
use ndarray::{Array1, ArrayView2, Axis};

#[derive(Debug, Clone, PartialEq)]
pub struct WindowStats {
    pub mean: Array1<f64>,
    /// Sample variance, divisor `W - 1`.
    pub variance: Array1<f64>,
}

/// Checks window size and sequence length before any work is done.
pub fn validate_window(len: usize, window_size: usize) -> BoundaryResult<()> {
    if window_size < 2 {
        return Err(BoundaryError::InvalidWindowSize(window_size));
    }
    if len < 2 * window_size {
        return Err(BoundaryError::InsufficientData { len, window_size });
    }
    Ok(())
}

/// Number of window placements for a sequence of `len` rows.
pub fn placement_count(len: usize, window_size: usize) -> usize {
    (len + 1).saturating_sub(2 * window_size)
}

/// Relative size below which a variance is rounding noise.
const VARIANCE_TOLERANCE: f64 = 16.0 * f64::EPSILON;

/// Zero when `variance` is indistinguishable from rounding error at `scale`.
fn snap_variance(variance: f64, scale: f64) -> f64 {
    if variance <= VARIANCE_TOLERANCE * scale {
        0.0
    } else {
        variance
    }
}

pub struct WindowStatistics {
    window_size: usize,
    dimension: usize,
    shift: Vec<f64>,
    // (N + 1) x D, row i holds the sums over rows [0, i)
    prefix_sum: Vec<f64>,
    prefix_sq: Vec<f64>,
}

impl WindowStatistics {
    pub fn build(sequence: &OrderedSequence, window_size: usize) -> BoundaryResult<Self> {
        validate_window(sequence.len(), window_size)?;

        let features = sequence.features();
        let (rows, dimension) = features.dim();
        let shift = features.row(0).to_vec();

        let mut prefix_sum = vec![0.0; (rows + 1) * dimension];
        let mut prefix_sq = vec![0.0; (rows + 1) * dimension];

        for (i, row) in features.outer_iter().enumerate() {
            let prev = i * dimension;
            let next = (i + 1) * dimension;
            for (d, &value) in row.iter().enumerate() {
                let x = value - shift[d];
                prefix_sum[next + d] = prefix_sum[prev + d] + x;
                prefix_sq[next + d] = prefix_sq[prev + d] + x * x;
            }
        }

        Ok(Self {
            window_size,
            dimension,
            shift,
            prefix_sum,
            prefix_sq,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Statistics of rows `[start, start + W)`.
    pub fn stats_at(&self, start: usize) -> WindowStats {
        let w = self.window_size as f64;
        let lo = start * self.dimension;
        let hi = (start + self.window_size) * self.dimension;

        let mut mean = Array1::zeros(self.dimension);
        let mut variance = Array1::zeros(self.dimension);
        for d in 0..self.dimension {
            let sum = self.prefix_sum[hi + d] - self.prefix_sum[lo + d];
            let sq = self.prefix_sq[hi + d] - self.prefix_sq[lo + d];
            mean[d] = self.shift[d] + sum / w;
            // rounding on the running sums grows with their magnitude, not the window's
            let scale = (self.prefix_sq[hi + d]
                + self.prefix_sq[lo + d]
                + sum.abs() * (self.prefix_sum[hi + d].abs() + self.prefix_sum[lo + d].abs()) / w)
                / (w - 1.0);
            variance[d] = snap_variance((sq - sum * sum / w) / (w - 1.0), scale);
        }

        WindowStats { mean, variance }
    }

    /// (before, after) statistics for placement `i`.
    pub fn pair_at(&self, i: usize) -> (WindowStats, WindowStats) {
        (self.stats_at(i), self.stats_at(i + self.window_size))
    }
}

/// From-scratch statistics over a window view. Reference for the prefix
/// formulation and the pairwise scoring entry point.
pub fn naive_window_stats(window: ArrayView2<'_, f64>) -> WindowStats {
    let n = window.nrows() as f64;
    let dimension = window.ncols();
    let mean = window
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(dimension));

    let mut variance = Array1::zeros(dimension);
    if n > 1.0 {
        for row in window.outer_iter() {
            for d in 0..dimension {
                let delta = row[d] - mean[d];
                variance[d] += delta * delta;
            }
        }
        for d in 0..dimension {
            variance[d] = snap_variance(variance[d] / (n - 1.0), mean[d] * mean[d]);
        }
    }

    WindowStats { mean, variance }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sequence_from_rows(rows: Vec<Vec<f64>>) -> OrderedSequence {
        OrderedSequence::from_pairs(rows.into_iter().enumerate().map(|(i, row)| {
            (
                format!("split_{}_{}_iframe_001.jpg", i * 10, i * 10 + 9),
                row,
            )
        }))
        .unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_known_values() {
        let seq = sequence_from_rows(vec![
            vec![1.0, 10.0],
            vec![2.0, 10.0],
            vec![3.0, 10.0],
            vec![4.0, 10.0],
        ]);
        let stats = WindowStatistics::build(&seq, 2).unwrap();

        let (before, after) = stats.pair_at(0);
        assert!(close(before.mean[0], 1.5));
        assert!(close(before.variance[0], 0.5));
        assert!(close(after.mean[0], 3.5));
        assert!(close(after.variance[0], 0.5));
        assert_eq!(before.variance[1], 0.0);
        assert_eq!(after.mean[1], 10.0);
    }

    #[test]
    fn test_insufficient_data() {
        let seq = sequence_from_rows(vec![vec![1.0]; 5]);
        let err = WindowStatistics::build(&seq, 3).err().unwrap();
        assert!(matches!(
            err,
            BoundaryError::InsufficientData { len: 5, window_size: 3 }
        ));
    }

    #[test]
    fn test_window_size_must_be_at_least_two() {
        let seq = sequence_from_rows(vec![vec![1.0]; 5]);
        let err = WindowStatistics::build(&seq, 1).err().unwrap();
        assert!(matches!(err, BoundaryError::InvalidWindowSize(1)));
    }

    #[test]
    fn test_placement_count() {
        assert_eq!(placement_count(10, 2), 7);
        assert_eq!(placement_count(4, 2), 1);
        assert_eq!(placement_count(3, 2), 0);
    }

    #[test]
    fn test_prefix_matches_naive_on_random_sequences() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..25 {
            let window_size = rng.gen_range(2..8);
            let len = rng.gen_range(2 * window_size..2 * window_size + 30);
            let dimension = rng.gen_range(1..12);
            let scale = [1.0, 100.0, 10_000.0][rng.gen_range(0..3)];

            let rows: Vec<Vec<f64>> = (0..len)
                .map(|_| (0..dimension).map(|_| rng.gen::<f64>() * scale).collect())
                .collect();
            let seq = sequence_from_rows(rows);
            let stats = WindowStatistics::build(&seq, window_size).unwrap();

            for start in 0..=(len - window_size) {
                let fast = stats.stats_at(start);
                let slow = naive_window_stats(seq.window(start, window_size));
                for d in 0..dimension {
                    assert!(close(fast.mean[d], slow.mean[d]), "mean mismatch at {start}/{d}");
                    assert!(
                        (fast.variance[d] - slow.variance[d]).abs()
                            <= 1e-9 * slow.variance[d].max(scale * scale * 1e-3),
                        "variance mismatch at {start}/{d}: {} vs {}",
                        fast.variance[d],
                        slow.variance[d]
                    );
                }
            }
        }
    }

    #[test]
    fn test_constant_fractional_column_has_zero_variance() {
        // dim 1 is 0.1 then 0.7, neither exactly representable
        let rows: Vec<Vec<f64>> = (0..6)
            .map(|i| vec![(i + 1) as f64, if i < 3 { 0.1 } else { 0.7 }])
            .collect();
        let seq = sequence_from_rows(rows);
        let stats = WindowStatistics::build(&seq, 3).unwrap();

        for start in 0..=3 {
            let fast = stats.stats_at(start);
            let slow = naive_window_stats(seq.window(start, 3));
            if start == 0 || start == 3 {
                assert_eq!(fast.variance[1], 0.0, "prefix variance at {start}");
                assert_eq!(slow.variance[1], 0.0, "naive variance at {start}");
            } else {
                assert!(fast.variance[1] > 0.0);
                assert!(close(fast.variance[1], slow.variance[1]));
            }
            assert!(close(fast.variance[0], 1.0));
        }
    }

    #[test]
    fn test_integer_histograms_are_exact() {
        let rows: Vec<Vec<f64>> = (0..12)
            .map(|i| vec![(i % 3) as f64 * 250.0, 1200.0, (i * 7 % 5) as f64])
            .collect();
        let seq = sequence_from_rows(rows);
        let stats = WindowStatistics::build(&seq, 3).unwrap();
        for start in 0..=9 {
            let fast = stats.stats_at(start);
            let slow = naive_window_stats(seq.window(start, 3));
            assert_eq!(fast.mean, slow.mean);
            assert_eq!(fast.variance[1], 0.0);
        }
    }
}
