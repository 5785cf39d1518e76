//! Two-class linear discriminant fitted on a (before, after) window pair.
//!
//! Before-window rows are class 0, after-window rows class 1. Both classes
//! have `W` rows, so the priors are equal and the decision threshold sits at
//! the projected midpoint of the class means.

use super::error::{BoundaryError, BoundaryResult};
use super::linalg::cholesky_solve;
use ndarray::{concatenate, Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LdaConfig {
    /// Shrinks the pooled covariance toward `tr(Sw)/D · I`. `None` fits the
    /// raw covariance and reports singular windows.
    pub shrinkage: Option<f64>,
}

impl LdaConfig {
    pub fn validate(&self) -> BoundaryResult<()> {
        match self.shrinkage {
            Some(lambda) if !(0.0..=1.0).contains(&lambda) => Err(BoundaryError::InvalidConfig(
                format!("shrinkage must lie in [0, 1], got {lambda}"),
            )),
            _ => Ok(()),
        }
    }
}

/// 拟合结果：判别方向与阈值
#[derive(Debug, Clone)]
pub struct LinearDiscriminant {
    pub weights: Array1<f64>,
    pub threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingularFit;

impl LinearDiscriminant {
    pub fn fit(
        before: ArrayView2<'_, f64>,
        after: ArrayView2<'_, f64>,
        config: &LdaConfig,
    ) -> Result<Self, SingularFit> {
        let dimension = before.ncols();
        let n = before.nrows() + after.nrows();
        if n < 3 || dimension == 0 || after.ncols() != dimension {
            return Err(SingularFit);
        }

        let mean0 = before.mean_axis(Axis(0)).ok_or(SingularFit)?;
        let mean1 = after.mean_axis(Axis(0)).ok_or(SingularFit)?;

        let centered0 = &before - &mean0;
        let centered1 = &after - &mean1;
        let centered = concatenate(Axis(0), &[centered0.view(), centered1.view()])
            .map_err(|_| SingularFit)?;

        let mut within: Array2<f64> = centered.t().dot(&centered) / (n - 2) as f64;

        if let Some(lambda) = config.shrinkage {
            let lambda = lambda.clamp(0.0, 1.0);
            let target = within.diag().sum() / dimension as f64;
            within.mapv_inplace(|v| v * (1.0 - lambda));
            for d in 0..dimension {
                within[[d, d]] += lambda * target;
            }
        }

        let diff = &mean1 - &mean0;
        let weights = cholesky_solve(&within, &diff).ok_or(SingularFit)?;
        let midpoint = (&mean0 + &mean1) * 0.5;
        let threshold = weights.dot(&midpoint);

        Ok(Self { weights, threshold })
    }

    /// 1 for the after-window class, 0 otherwise. Ties go to class 0.
    pub fn predict(&self, row: ArrayView1<'_, f64>) -> u8 {
        if self.weights.dot(&row) > self.threshold {
            1
        } else {
            0
        }
    }

    /// Fraction of the training rows labelled correctly.
    pub fn accuracy(&self, before: ArrayView2<'_, f64>, after: ArrayView2<'_, f64>) -> f64 {
        let total = before.nrows() + after.nrows();
        if total == 0 {
            return 0.0;
        }
        let correct = before
            .outer_iter()
            .filter(|row| self.predict(row.view()) == 0)
            .count()
            + after
                .outer_iter()
                .filter(|row| self.predict(row.view()) == 1)
                .count();
        correct as f64 / total as f64
    }
}

/// Fits on the window pair and returns the self-classification accuracy.
pub fn classifier_accuracy(
    before: ArrayView2<'_, f64>,
    after: ArrayView2<'_, f64>,
    config: &LdaConfig,
) -> Result<f64, SingularFit> {
    let model = LinearDiscriminant::fit(before, after, config)?;
    Ok(model.accuracy(before, after))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn square() -> Array2<f64> {
        array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]
    }

    #[test]
    fn test_separable_windows_score_one() {
        let before = array![[0.0, 0.0], [0.1, 0.2], [0.2, 0.1], [0.05, 0.15], [0.15, 0.05]];
        let after = &before + 10.0;
        let score = classifier_accuracy(before.view(), after.view(), &LdaConfig::default()).unwrap();
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_identical_windows_score_half() {
        let window = square();
        let score = classifier_accuracy(window.view(), window.view(), &LdaConfig::default()).unwrap();
        assert_eq!(score, 0.5);
    }

    #[test]
    fn test_overlapping_windows_in_unit_interval() {
        let before = array![[0.0, 1.0], [2.0, 0.5], [1.0, 3.0], [2.5, 2.0]];
        let after = array![[0.5, 0.5], [2.0, 1.5], [1.5, 2.5], [3.0, 1.0]];
        let score = classifier_accuracy(before.view(), after.view(), &LdaConfig::default()).unwrap();
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_constant_dimension_is_singular() {
        let before = array![[0.0, 5.0], [1.0, 5.0], [2.0, 5.0]];
        let after = array![[3.0, 5.0], [4.0, 5.0], [5.0, 5.0]];
        assert_eq!(
            classifier_accuracy(before.view(), after.view(), &LdaConfig::default()),
            Err(SingularFit)
        );
    }

    #[test]
    fn test_shrinkage_recovers_constant_dimension() {
        let before = array![[0.0, 5.0], [1.0, 5.0], [2.0, 5.0]];
        let after = array![[10.0, 5.0], [11.0, 5.0], [12.0, 5.0]];
        let config = LdaConfig {
            shrinkage: Some(0.1),
        };
        let score = classifier_accuracy(before.view(), after.view(), &config).unwrap();
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_shrinkage_outside_unit_interval_is_rejected() {
        for lambda in [-0.1, 1.5, f64::NAN] {
            let config = LdaConfig {
                shrinkage: Some(lambda),
            };
            assert!(matches!(config.validate(), Err(BoundaryError::InvalidConfig(_))));
        }
        assert!(LdaConfig::default().validate().is_ok());
        assert!(LdaConfig { shrinkage: Some(1.0) }.validate().is_ok());
    }

    #[test]
    fn test_more_dimensions_than_samples_is_singular() {
        let before = array![[1.0, 0.0, 3.0], [0.0, 2.0, 1.0]];
        let after = array![[4.0, 1.0, 0.0], [2.0, 2.0, 2.0]];
        assert!(LinearDiscriminant::fit(before.view(), after.view(), &LdaConfig::default()).is_err());
    }
}
