//! Candidate selection over a score sequence.
//!
//! Peaks are strict local maxima: a plateau of equal values never peaks, and
//! the first and last scores have no two-sided neighbourhood.

use super::error::BoundaryResult;
use super::locator::locate_boundary;
use super::record::{BoundaryCandidate, ScoreRecord, SelectionReason};
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExtractionMode {
    /// `score <= threshold`
    ThresholdLow { threshold: f64 },
    /// `score > threshold`
    ThresholdHigh { threshold: f64 },
    Peak {
        #[serde(default)]
        min_height: Option<f64>,
    },
}

impl ExtractionMode {
    pub fn reason(&self) -> SelectionReason {
        match self {
            ExtractionMode::ThresholdLow { .. } => SelectionReason::ThresholdLow,
            ExtractionMode::ThresholdHigh { .. } => SelectionReason::ThresholdHigh,
            ExtractionMode::Peak { .. } => SelectionReason::Peak,
        }
    }
}

impl Default for ExtractionMode {
    fn default() -> Self {
        ExtractionMode::Peak { min_height: None }
    }
}

/// Indices selected by `mode`, ascending.
pub fn select_indices(scores: &[f64], mode: &ExtractionMode) -> Vec<usize> {
    match *mode {
        ExtractionMode::ThresholdLow { threshold } => scores
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s <= threshold)
            .map(|(i, _)| i)
            .collect(),
        ExtractionMode::ThresholdHigh { threshold } => scores
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s > threshold)
            .map(|(i, _)| i)
            .collect(),
        ExtractionMode::Peak { min_height } => find_peaks(scores, min_height),
    }
}

fn find_peaks(scores: &[f64], min_height: Option<f64>) -> Vec<usize> {
    scores
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[0] < w[1] && w[1] > w[2])
        .map(|(i, _)| i + 1)
        .filter(|&i| min_height.map_or(true, |h| scores[i] >= h))
        .collect()
}

/// Maximal ranges of `records` whose `start_index` values are consecutive.
fn contiguous_runs(records: &[ScoreRecord]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=records.len() {
        if i == records.len() || records[i].start_index != records[i - 1].start_index + 1 {
            runs.push(start..i);
            start = i;
        }
    }
    runs
}

/// Selects records and maps each to an estimated boundary frame.
///
/// `record_index` is the position in `records`. Peaks are searched within
/// each run of consecutive placements, so a gap left by skipped or
/// unevaluated placements is never bridged.
pub fn extract_candidates(
    records: &[ScoreRecord],
    mode: &ExtractionMode,
) -> BoundaryResult<Vec<BoundaryCandidate>> {
    let scores: Vec<f64> = records.iter().map(|r| r.score).collect();
    let reason = mode.reason();

    let selected: Vec<usize> = match mode {
        ExtractionMode::Peak { .. } => contiguous_runs(records)
            .into_iter()
            .flat_map(|run| {
                let offset = run.start;
                select_indices(&scores[run], mode)
                    .into_iter()
                    .map(move |i| i + offset)
            })
            .collect(),
        _ => select_indices(&scores, mode),
    };

    selected
        .into_iter()
        .map(|i| {
            let record = &records[i];
            Ok(BoundaryCandidate {
                record_index: i,
                frame: locate_boundary(&record.before, &record.after)?,
                score: record.score,
                reason,
            })
        })
        .collect()
}
