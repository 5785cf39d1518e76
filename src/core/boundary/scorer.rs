//! 判别评分：分类准确率 / Fisher 可分性
//!
//! Both strategies are pure functions of a (before, after) window pair.

use super::error::{BoundaryError, BoundaryResult};
use super::lda::{classifier_accuracy, LdaConfig};
use super::window_stats::{naive_window_stats, WindowStats};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// What to do with a dimension whose pooled variance `v1 + v2` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", content = "epsilon", rename_all = "snake_case")]
pub enum ZeroVariancePolicy {
    /// The dimension adds 0 to the sum and is counted as degenerate.
    #[default]
    ZeroContribution,
    /// Every denominator becomes `v1 + v2 + epsilon`; epsilon must be finite
    /// and positive.
    Epsilon(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FisherConfig {
    pub zero_variance: ZeroVariancePolicy,
}

impl FisherConfig {
    pub fn validate(&self) -> BoundaryResult<()> {
        match self.zero_variance {
            ZeroVariancePolicy::Epsilon(epsilon) if !(epsilon.is_finite() && epsilon > 0.0) => {
                Err(BoundaryError::InvalidConfig(format!(
                    "zero-variance epsilon must be finite and positive, got {epsilon}"
                )))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discriminant {
    ClassifierAccuracy(LdaConfig),
    Fisher(FisherConfig),
}

impl Default for Discriminant {
    fn default() -> Self {
        Discriminant::Fisher(FisherConfig::default())
    }
}

/// 单次评分结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowScore {
    pub score: f64,
    /// Fisher dimensions whose zero pooled variance made them contribute 0.
    pub degenerate_dimensions: usize,
}

impl Discriminant {
    pub fn name(&self) -> &'static str {
        match self {
            Discriminant::ClassifierAccuracy(_) => "classifier-accuracy",
            Discriminant::Fisher(_) => "fisher",
        }
    }

    pub fn validate(&self) -> BoundaryResult<()> {
        match self {
            Discriminant::ClassifierAccuracy(config) => config.validate(),
            Discriminant::Fisher(config) => config.validate(),
        }
    }

    /// Scores a window pair from scratch. `start_index` only labels a
    /// singular-covariance error.
    pub fn score_windows(
        &self,
        before: ArrayView2<'_, f64>,
        after: ArrayView2<'_, f64>,
        start_index: usize,
    ) -> BoundaryResult<WindowScore> {
        self.validate()?;
        match self {
            Discriminant::ClassifierAccuracy(config) => {
                let score = classifier_accuracy(before, after, config)
                    .map_err(|_| BoundaryError::SingularCovariance { start_index })?;
                Ok(WindowScore {
                    score,
                    degenerate_dimensions: 0,
                })
            }
            Discriminant::Fisher(config) => Ok(fisher_from_stats(
                &naive_window_stats(before),
                &naive_window_stats(after),
                config,
            )),
        }
    }
}

/// Mean over dimensions of `(m2 - m1)² / (v1 + v2)`. `config` is expected to
/// have passed [`FisherConfig::validate`].
pub fn fisher_from_stats(
    before: &WindowStats,
    after: &WindowStats,
    config: &FisherConfig,
) -> WindowScore {
    let dimension = before.mean.len();
    if dimension == 0 {
        return WindowScore {
            score: 0.0,
            degenerate_dimensions: 0,
        };
    }

    let mut total = 0.0;
    let mut degenerate = 0;
    for d in 0..dimension {
        let diff = after.mean[d] - before.mean[d];
        let pooled = before.variance[d] + after.variance[d];
        match config.zero_variance {
            ZeroVariancePolicy::ZeroContribution => {
                if pooled > 0.0 {
                    total += diff * diff / pooled;
                } else {
                    degenerate += 1;
                }
            }
            ZeroVariancePolicy::Epsilon(epsilon) => {
                total += diff * diff / (pooled + epsilon);
            }
        }
    }

    WindowScore {
        score: total / dimension as f64,
        degenerate_dimensions: degenerate,
    }
}
