//! 节目边界检测器

use crate::core::boundary::{
    BoundaryDetector, BoundaryResult, CancelFlag, DetectionConfig, DetectionReport,
    OrderedSequence,
};
use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// 节目边界检测器 - 滑动窗口判别评分 + 候选边界提取
///
/// ```no_run
/// use program_boundary::api::detector::ProgramBoundaryDetector;
/// use program_boundary::core::boundary::DetectionConfig;
///
/// let detector = ProgramBoundaryDetector::create(DetectionConfig::for_fisher_peaks());
/// let report = detector.detect_from_json_file("histograms.json")?;
/// for candidate in &report.candidates {
///     println!("{} {:.3}", candidate.frame, candidate.score);
/// }
/// # Ok::<(), program_boundary::core::boundary::BoundaryError>(())
/// ```
pub struct ProgramBoundaryDetector {
    detector: BoundaryDetector,
}

impl ProgramBoundaryDetector {
    /// 创建检测器（同时初始化日志）
    pub fn create(config: DetectionConfig) -> Self {
        crate::init_logging();
        info!(
            "🎬 ProgramBoundaryDetector: created (window={}, strategy={})",
            config.window_size,
            config.discriminant.name()
        );
        Self {
            detector: BoundaryDetector::new(config),
        }
    }

    /// 从 JSON 配置字符串创建
    pub fn from_config_json(json: &str) -> BoundaryResult<Self> {
        Ok(Self::create(DetectionConfig::from_json_str(json)?))
    }

    pub fn config(&self) -> &DetectionConfig {
        self.detector.config()
    }

    /// 取消标记，可在其他线程中调用 `cancel()`
    pub fn cancel_flag(&self) -> CancelFlag {
        self.detector.cancel_flag()
    }

    /// 对 (标识符, 特征向量) 列表排序、评分并提取候选边界
    pub fn detect(&self, features: Vec<(String, Vec<f64>)>) -> BoundaryResult<DetectionReport> {
        let sequence = OrderedSequence::from_pairs(features)?;
        self.detect_sequence(&sequence)
    }

    pub fn detect_sequence(&self, sequence: &OrderedSequence) -> BoundaryResult<DetectionReport> {
        info!("📥 Detecting boundaries over {} segments", sequence.len());
        self.detector.detect(sequence)
    }

    /// 读取 JSON 直方图文件后检测
    pub fn detect_from_json_file<P: AsRef<Path>>(&self, path: P) -> BoundaryResult<DetectionReport> {
        let path = path.as_ref();
        info!("📂 Loading feature vectors from {:?}", path);
        let reader = BufReader::new(File::open(path)?);
        let sequence = OrderedSequence::from_json_reader(reader)?;
        self.detect_sequence(&sequence)
    }
}

impl Drop for ProgramBoundaryDetector {
    fn drop(&mut self) {
        info!("🗑️ ProgramBoundaryDetector: released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::boundary::{BoundaryError, ExtractionMode, RunStatus};
    use std::io::Write;

    fn step_features() -> Vec<(String, Vec<f64>)> {
        (0..12)
            .map(|k| {
                let noise = ((k * 37) % 7) as f64 * 0.1;
                let level = if k < 6 { 0.0 } else { 20.0 };
                (
                    format!("split_{}_{}_iframe_001.jpg", k * 25, k * 25 + 24),
                    vec![level + noise, 3.0],
                )
            })
            .collect()
    }

    #[test]
    fn test_detect_step_change() {
        let detector = ProgramBoundaryDetector::from_config_json(
            r#"{"window_size": 3, "discriminant": {"kind": "fisher"},
                "extraction": {"mode": "threshold_high", "threshold": 50.0}}"#,
        )
        .unwrap();

        let report = detector.detect(step_features()).unwrap();
        assert!(matches!(report.status, RunStatus::Complete));
        assert_eq!(report.records.len(), 12 - 6 + 1);
        assert_eq!(report.candidates.len(), 1);
        // segment 5 ends at 149, segment 6 starts at 150
        assert_eq!(report.candidates[0].frame, 150);
        assert!(report.records.iter().all(|r| r.degenerate_dimensions >= 1));
    }

    #[test]
    fn test_detect_rejects_malformed_identifier() {
        let detector = ProgramBoundaryDetector::create(DetectionConfig {
            window_size: 2,
            ..DetectionConfig::for_fisher()
        });
        let mut features = step_features();
        features[4].0 = "Unknown".to_string();
        let err = detector.detect(features).unwrap_err();
        assert!(matches!(err, BoundaryError::MalformedIdentifier { .. }));
    }

    #[test]
    fn test_detect_from_json_file() {
        let path = std::env::temp_dir().join(format!(
            "program_boundary_features_{}.json",
            std::process::id()
        ));
        let json = serde_json::to_string(
            &step_features()
                .into_iter()
                .collect::<std::collections::BTreeMap<_, _>>(),
        )
        .unwrap();
        File::create(&path)
            .unwrap()
            .write_all(json.as_bytes())
            .unwrap();

        let detector = ProgramBoundaryDetector::create(DetectionConfig {
            window_size: 3,
            extraction: ExtractionMode::Peak { min_height: None },
            ..DetectionConfig::for_fisher()
        });
        let report = detector.detect_from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(report.records.len(), 7);
        assert!(report.candidates.iter().any(|c| c.frame == 150));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let detector = ProgramBoundaryDetector::create(DetectionConfig::default());
        let err = detector
            .detect_from_json_file("/nonexistent/features.json")
            .unwrap_err();
        assert!(matches!(err, BoundaryError::Io(_)));
    }
}
