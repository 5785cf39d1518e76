//! 片段标识符解析
//!
//! Keyframe images are named `split_<start>_<end>_iframe_<sub>.jpg`, where
//! `start`/`end` are the frame range of the shot in the source video.

use super::error::{BoundaryError, BoundaryResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

static SEGMENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^split_(\d+)_(\d+)_iframe_(\d+)\.jpg$").expect("segment pattern is valid")
});

/// 解析后的片段标识符
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentId {
    pub raw: String,
    pub start_frame: u64,
    pub end_frame: u64,
    pub sub_index: u64,
}

impl SegmentId {
    pub fn parse(raw: &str) -> BoundaryResult<Self> {
        let malformed = || BoundaryError::MalformedIdentifier {
            identifier: raw.to_string(),
        };

        let caps = SEGMENT_PATTERN.captures(raw).ok_or_else(malformed)?;
        // Digits that overflow u64 are as unusable as a pattern miss.
        let field = |i: usize| -> BoundaryResult<u64> {
            caps[i].parse::<u64>().map_err(|_| malformed())
        };

        Ok(Self {
            raw: raw.to_string(),
            start_frame: field(1)?,
            end_frame: field(2)?,
            sub_index: field(3)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl AsRef<str> for SegmentId {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
