//! 滑动窗口评分流水线
//!
//! One sequential pass builds the running sums, then every window placement
//! is scored independently on a rayon pool. Cancellation is checked before
//! each placement, so a fit already in progress always finishes.

use super::config::{DetectionConfig, SingularPolicy};
use super::error::{BoundaryError, BoundaryResult};
use super::extractor::extract_candidates;
use super::record::{BoundaryCandidate, ScoreRecord};
use super::scorer::{fisher_from_stats, Discriminant, WindowScore};
use super::sequence::OrderedSequence;
use super::window_stats::{placement_count, validate_window, WindowStatistics};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// 协作式取消标记，可跨线程克隆共享
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub enum RunStatus {
    Complete,
    /// Some placements were never evaluated.
    Cancelled,
    /// Scoring stopped at a failing placement; records before it are kept.
    Aborted(BoundaryError),
}

/// 评分结果；非 Complete 状态下 records 为部分结果
#[derive(Debug)]
pub struct ScoreRun {
    pub records: Vec<ScoreRecord>,
    /// Placements left out under `SingularPolicy::Skip`.
    pub skipped: Vec<usize>,
    pub status: RunStatus,
}

impl ScoreRun {
    pub fn is_complete(&self) -> bool {
        matches!(self.status, RunStatus::Complete)
    }

    pub fn into_complete(self) -> BoundaryResult<Vec<ScoreRecord>> {
        match self.status {
            RunStatus::Complete => Ok(self.records),
            RunStatus::Cancelled => Err(BoundaryError::Cancelled),
            RunStatus::Aborted(err) => Err(err),
        }
    }
}

#[derive(Debug)]
pub struct DetectionReport {
    pub records: Vec<ScoreRecord>,
    pub candidates: Vec<BoundaryCandidate>,
    pub skipped: Vec<usize>,
    pub status: RunStatus,
}

enum Outcome {
    Scored(ScoreRecord),
    Failed(usize, BoundaryError),
    NotRun,
}

pub struct BoundaryDetector {
    config: DetectionConfig,
    cancel: CancelFlag,
}

impl BoundaryDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Scores every window placement. The config, window size and sequence
    /// length are checked before anything is scored.
    pub fn score(&self, sequence: &OrderedSequence) -> BoundaryResult<ScoreRun> {
        self.config.validate()?;
        let window_size = self.config.window_size;
        validate_window(sequence.len(), window_size)?;

        let placements = placement_count(sequence.len(), window_size);
        let stats = match self.config.discriminant {
            Discriminant::Fisher(_) => Some(WindowStatistics::build(sequence, window_size)?),
            Discriminant::ClassifierAccuracy(_) => None,
        };

        let threads = self.config.threads();
        info!(
            "🔍 Scoring {} placements: window={}, strategy={}, threads={}",
            placements,
            window_size,
            self.config.discriminant.name(),
            threads
        );
        let started = Instant::now();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?;
        // Lowest placement that failed fatally; later placements are not started.
        let first_failure = AtomicUsize::new(usize::MAX);
        let abort_on_singular = self.config.singular_policy == SingularPolicy::Abort;

        let outcomes: Vec<Outcome> = pool.install(|| {
            (0..placements)
                .into_par_iter()
                .map(|i| {
                    if self.cancel.is_cancelled() || i > first_failure.load(Ordering::Relaxed) {
                        return Outcome::NotRun;
                    }
                    match self.score_placement(sequence, stats.as_ref(), i) {
                        Ok(result) => Outcome::Scored(build_record(sequence, window_size, i, result)),
                        Err(err) => {
                            let fatal = abort_on_singular
                                || !matches!(err, BoundaryError::SingularCovariance { .. });
                            if fatal {
                                first_failure.fetch_min(i, Ordering::Relaxed);
                            }
                            Outcome::Failed(i, err)
                        }
                    }
                })
                .collect()
        });

        let mut records = Vec::with_capacity(placements);
        let mut skipped = Vec::new();
        let mut aborted: Option<(usize, BoundaryError)> = None;
        let mut not_run = 0usize;

        for outcome in outcomes {
            match outcome {
                Outcome::Scored(record) => records.push(record),
                Outcome::Failed(i, err) => {
                    let skippable = !abort_on_singular
                        && matches!(err, BoundaryError::SingularCovariance { .. });
                    if skippable {
                        debug!("⏭️ Skipping singular placement {}", i);
                        skipped.push(i);
                    } else if aborted.is_none() {
                        aborted = Some((i, err));
                    }
                }
                Outcome::NotRun => not_run += 1,
            }
        }

        let status = match aborted {
            Some((index, err)) => {
                // Only the prefix before the failure is meaningful.
                records.retain(|r| r.start_index < index);
                warn!(
                    "⚠️ Scoring aborted at placement {}: {} ({} records kept)",
                    index,
                    err,
                    records.len()
                );
                RunStatus::Aborted(err)
            }
            None if not_run > 0 => {
                warn!(
                    "⏹️ Scoring cancelled: {} of {} placements evaluated",
                    records.len() + skipped.len(),
                    placements
                );
                RunStatus::Cancelled
            }
            None => RunStatus::Complete,
        };

        if !skipped.is_empty() {
            warn!("⚠️ {} singular placements skipped", skipped.len());
        }
        info!(
            "✅ Scored {} placements in {:.2?}",
            records.len(),
            started.elapsed()
        );

        Ok(ScoreRun {
            records,
            skipped,
            status,
        })
    }

    /// Scores the sequence and extracts boundary candidates from whatever
    /// records the run produced. Peaks never span placements missing from a
    /// skipped or cancelled run.
    pub fn detect(&self, sequence: &OrderedSequence) -> BoundaryResult<DetectionReport> {
        let run = self.score(sequence)?;
        let candidates = extract_candidates(&run.records, &self.config.extraction)?;

        info!(
            "🎯 {} boundary candidates from {} records",
            candidates.len(),
            run.records.len()
        );

        Ok(DetectionReport {
            records: run.records,
            candidates,
            skipped: run.skipped,
            status: run.status,
        })
    }

    fn score_placement(
        &self,
        sequence: &OrderedSequence,
        stats: Option<&WindowStatistics>,
        i: usize,
    ) -> BoundaryResult<WindowScore> {
        let window_size = self.config.window_size;
        match (&self.config.discriminant, stats) {
            (Discriminant::Fisher(config), Some(stats)) => {
                let (before, after) = stats.pair_at(i);
                Ok(fisher_from_stats(&before, &after, config))
            }
            (discriminant, _) => discriminant.score_windows(
                sequence.window(i, window_size),
                sequence.window(i + window_size, window_size),
                i,
            ),
        }
    }
}

fn build_record(
    sequence: &OrderedSequence,
    window_size: usize,
    i: usize,
    result: WindowScore,
) -> ScoreRecord {
    let to_strings = |start: usize| {
        sequence
            .window_ids(start, window_size)
            .iter()
            .map(|id| id.raw.clone())
            .collect::<Vec<_>>()
    };

    ScoreRecord {
        start_index: i,
        start_frame: sequence.ids()[i].start_frame,
        score: result.score,
        degenerate_dimensions: result.degenerate_dimensions,
        before: to_strings(i),
        after: to_strings(i + window_size),
    }
}
