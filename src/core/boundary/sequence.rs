//! 有序特征序列（Sequence Assembler）

use super::error::{BoundaryError, BoundaryResult};
use super::identifier::SegmentId;
use log::{debug, warn};
use ndarray::{s, Array2, ArrayView2};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;

/// 按起始帧排序的 (标识符, 特征向量) 序列，构建后不可变
#[derive(Debug, Clone)]
pub struct OrderedSequence {
    ids: Vec<SegmentId>,
    features: Array2<f64>,
}

/// JSON 中的单个特征条目：扁平向量或按通道拆分的直方图
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureEntry {
    Flat(Vec<f64>),
    Channels(Vec<Vec<f64>>),
}

impl FeatureEntry {
    fn into_flat(self) -> Vec<f64> {
        match self {
            FeatureEntry::Flat(v) => v,
            FeatureEntry::Channels(channels) => channels.concat(),
        }
    }
}

impl OrderedSequence {
    /// Parses every identifier, checks that all vectors share one length and
    /// stable-sorts by start frame. Duplicate start frames keep input order.
    pub fn from_pairs<I>(pairs: I) -> BoundaryResult<Self>
    where
        I: IntoIterator<Item = (String, Vec<f64>)>,
    {
        let mut entries: Vec<(SegmentId, Vec<f64>)> = Vec::new();
        let mut dimension: Option<usize> = None;

        for (key, vector) in pairs {
            let id = SegmentId::parse(&key)?;
            match dimension {
                None => dimension = Some(vector.len()),
                Some(expected) if expected != vector.len() => {
                    return Err(BoundaryError::DimensionMismatch {
                        identifier: key,
                        expected,
                        found: vector.len(),
                    });
                }
                Some(_) => {}
            }
            entries.push((id, vector));
        }

        entries.sort_by_key(|(id, _)| id.start_frame);

        let duplicates = entries
            .windows(2)
            .filter(|pair| pair[0].0.start_frame == pair[1].0.start_frame)
            .count();
        if duplicates > 0 {
            warn!(
                "⚠️ {} segments share a start frame with their predecessor, keeping input order",
                duplicates
            );
        }

        let dimension = dimension.unwrap_or(0);
        let mut flat = Vec::with_capacity(entries.len() * dimension);
        let mut ids = Vec::with_capacity(entries.len());
        for (id, vector) in entries {
            flat.extend_from_slice(&vector);
            ids.push(id);
        }

        let features = Array2::from_shape_vec((ids.len(), dimension), flat)
            .map_err(|e| BoundaryError::InvalidFeatures(e.to_string()))?;

        debug!(
            "📦 Assembled {} segments with {} feature dimensions",
            ids.len(),
            dimension
        );

        Ok(Self { ids, features })
    }

    /// Concatenates per-channel histograms (R, G, B) into one feature vector
    /// per segment before assembling.
    pub fn from_channel_histograms<I>(pairs: I) -> BoundaryResult<Self>
    where
        I: IntoIterator<Item = (String, [Vec<f64>; 3])>,
    {
        Self::from_pairs(
            pairs
                .into_iter()
                .map(|(key, channels)| (key, channels.concat())),
        )
    }

    /// Reads a JSON object of `identifier -> [values]` or
    /// `identifier -> [[r...], [g...], [b...]]`.
    pub fn from_json_reader<R: Read>(reader: R) -> BoundaryResult<Self> {
        let raw: BTreeMap<String, FeatureEntry> = serde_json::from_reader(reader)?;
        Self::from_pairs(
            raw.into_iter()
                .map(|(key, entry)| (key, entry.into_flat())),
        )
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.features.ncols()
    }

    pub fn ids(&self) -> &[SegmentId] {
        &self.ids
    }

    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    /// Rows `[start, start + len)`. Panics when out of range, like slicing.
    pub fn window(&self, start: usize, len: usize) -> ArrayView2<'_, f64> {
        self.features.slice(s![start..start + len, ..])
    }

    pub fn window_ids(&self, start: usize, len: usize) -> &[SegmentId] {
        &self.ids[start..start + len]
    }
}
