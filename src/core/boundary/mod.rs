//! 节目边界检测核心
//!
//! Pipeline, leaf first:
//! 1. `sequence` - order (identifier, feature vector) pairs by start frame
//! 2. `window_stats` - running sums for per-window mean / variance
//! 3. `scorer` - classifier-accuracy (LDA) or Fisher separability per placement
//! 4. `extractor` - threshold / peak selection over the score sequence
//! 5. `locator` - map a window pair back to a source-video frame

pub mod config;
pub mod error;
pub mod extractor;
pub mod identifier;
pub mod lda;
mod linalg;
pub mod locator;
pub mod pipeline;
pub mod record;
pub mod scorer;
pub mod sequence;
pub mod window_stats;

pub use config::{DetectionConfig, SingularPolicy, DEFAULT_SHRINKAGE, DEFAULT_WINDOW_SIZE};
pub use error::{BoundaryError, BoundaryResult};
pub use extractor::{extract_candidates, select_indices, ExtractionMode};
pub use identifier::SegmentId;
pub use lda::{LdaConfig, LinearDiscriminant};
pub use locator::locate_boundary;
pub use pipeline::{BoundaryDetector, CancelFlag, DetectionReport, RunStatus, ScoreRun};
pub use record::{BoundaryCandidate, ScoreRecord, SelectionReason};
pub use scorer::{fisher_from_stats, Discriminant, FisherConfig, WindowScore, ZeroVariancePolicy};
pub use sequence::OrderedSequence;
pub use window_stats::{naive_window_stats, WindowStatistics, WindowStats};
