use serde::{Deserialize, Serialize};

/// 单个窗口位置的评分记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub start_index: usize,
    /// Start frame of the first before-window segment.
    pub start_frame: u64,
    pub score: f64,
    pub degenerate_dimensions: usize,
    pub before: Vec<String>,
    pub after: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    ThresholdLow,
    ThresholdHigh,
    Peak,
}

/// 候选节目边界
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCandidate {
    /// Position of the source record in the score sequence.
    pub record_index: usize,
    pub frame: u64,
    pub score: f64,
    pub reason: SelectionReason,
}
