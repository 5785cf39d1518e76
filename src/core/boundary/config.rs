use super::error::{BoundaryError, BoundaryResult};
use super::extractor::ExtractionMode;
use super::lda::LdaConfig;
use super::scorer::{Discriminant, FisherConfig};
use serde::{Deserialize, Serialize};

/// Window size used by the archive analysis runs.
pub const DEFAULT_WINDOW_SIZE: usize = 40;

/// Covariance shrinkage used by the classifier presets. Histogram windows
/// have fewer rows than bins, so the raw pooled covariance is never invertible.
pub const DEFAULT_SHRINKAGE: f64 = 0.1;

/// 单个窗口协方差奇异时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingularPolicy {
    /// Stop the run and keep the records computed so far.
    #[default]
    Abort,
    /// Leave the window out of the score sequence.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub window_size: usize,
    pub discriminant: Discriminant,
    pub extraction: ExtractionMode,
    pub singular_policy: SingularPolicy,
    /// Worker threads for scoring; `None` uses one per CPU.
    pub num_threads: Option<usize>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self::for_fisher_peaks()
    }
}

impl DetectionConfig {
    pub fn for_classifier() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            discriminant: Discriminant::ClassifierAccuracy(LdaConfig {
                shrinkage: Some(DEFAULT_SHRINKAGE),
            }),
            extraction: ExtractionMode::ThresholdLow { threshold: 0.89 },
            singular_policy: SingularPolicy::Abort,
            num_threads: None,
        }
    }

    pub fn for_classifier_high() -> Self {
        Self {
            extraction: ExtractionMode::ThresholdHigh { threshold: 0.98 },
            ..Self::for_classifier()
        }
    }

    pub fn for_fisher() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            discriminant: Discriminant::Fisher(FisherConfig::default()),
            extraction: ExtractionMode::ThresholdHigh { threshold: 0.4 },
            singular_policy: SingularPolicy::Abort,
            num_threads: None,
        }
    }

    pub fn for_fisher_peaks() -> Self {
        Self {
            extraction: ExtractionMode::Peak {
                min_height: Some(0.3),
            },
            ..Self::for_fisher()
        }
    }

    /// Parses and validates a JSON config.
    pub fn from_json_str(json: &str) -> BoundaryResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BoundaryResult<()> {
        if self.window_size < 2 {
            return Err(BoundaryError::InvalidWindowSize(self.window_size));
        }
        self.discriminant.validate()
    }

    pub fn threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get).max(1)
    }
}
