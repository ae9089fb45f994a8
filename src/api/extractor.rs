//! 和弦提取器：变化检测 → 分批识别 → 去重汇总

use log::{info, warn};

use crate::core::chart::{deduplicate, ChordChart, ChordSummary};
use crate::core::config::ExtractionConfig;
use crate::core::error::ChordError;
use crate::core::video::{ChangeDetector, ChangeEvent, DetectionOutcome, FrameSource};
use crate::core::vision::{AnnotationOutcome, BatchAnnotator, VisionAnnotator};
use crate::models::chord::AnnotatedEvent;

/// 提取统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionStats {
    pub frames_total: usize,
    pub frames_skipped: usize,
    pub changes_detected: usize,
    /// 不含第一帧
    pub changes_above_threshold: usize,
    pub batches: usize,
    pub failed_batches: Vec<usize>,
    pub timeline_len: usize,
}

#[derive(Debug, Clone)]
pub struct ExtractionReport {
    /// 去重前，按时间顺序
    pub raw_events: Vec<AnnotatedEvent>,
    pub timeline: Vec<AnnotatedEvent>,
    pub summary: ChordSummary,
    pub stats: ExtractionStats,
}

impl ExtractionReport {
    pub fn chart(&self, raw_json: bool) -> Result<ChordChart, ChordError> {
        let json_events = if raw_json {
            &self.raw_events
        } else {
            &self.timeline
        };
        ChordChart::new(&self.timeline, &self.summary, json_events)
    }
}

pub struct ChordExtractor {
    config: ExtractionConfig,
    annotator: Box<dyn VisionAnnotator>,
}

impl ChordExtractor {
    pub fn create(config: ExtractionConfig, annotator: Box<dyn VisionAnnotator>) -> Result<Self, ChordError> {
        config.validate()?;
        info!(
            "🎸 ChordExtractor: created (threshold={}, debounce={}, batch_size={})",
            config.change_threshold, config.debounce_frames, config.batch_size
        );
        Ok(Self { config, annotator })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn detect(&self, source: &FrameSource) -> DetectionOutcome {
        ChangeDetector::with_config(&self.config).detect(source)
    }

    pub fn annotate(&self, events: &[ChangeEvent]) -> Result<AnnotationOutcome, ChordError> {
        let outcome = BatchAnnotator::with_config(self.annotator.as_ref(), &self.config).annotate_all(events)?;
        if !outcome.failed_batches.is_empty() {
            warn!(
                "⚠️ {} of {} batches could not be parsed; their frames are marked '?'",
                outcome.failed_batches.len(),
                outcome.batches
            );
        }
        Ok(outcome)
    }

    /// 完整流程。没有检测到变化时返回 NoChangesDetected，由调用方决定是否调整阈值重试
    pub fn run(&self, source: &FrameSource) -> Result<ExtractionReport, ChordError> {
        info!(
            "[2/4] Detecting chord changes (threshold={})...",
            self.config.change_threshold
        );
        let detection = self.detect(source);
        if !detection.has_changes() {
            return Err(ChordError::NoChangesDetected {
                threshold: self.config.change_threshold,
            });
        }

        if detection.changes_above_threshold() == 0 {
            warn!(
                "⚠️ No changes above threshold {}; only the first frame will be analyzed",
                self.config.change_threshold
            );
        }

        info!("[3/4] Analyzing {} frames with vision model...", detection.events.len());
        let annotation = self.annotate(&detection.events)?;

        let raw_events = annotation.events;
        let timeline = deduplicate(raw_events.clone());
        let summary = ChordSummary::from_timeline(&timeline);

        let stats = ExtractionStats {
            frames_total: source.len(),
            frames_skipped: detection.frames_skipped,
            changes_detected: detection.events.len(),
            changes_above_threshold: detection.changes_above_threshold(),
            batches: annotation.batches,
            failed_batches: annotation.failed_batches,
            timeline_len: timeline.len(),
        };

        Ok(ExtractionReport {
            raw_events,
            timeline,
            summary,
            stats,
        })
    }
}

impl Drop for ChordExtractor {
    fn drop(&mut self) {
        info!("🗑️ ChordExtractor: released");
    }
}
