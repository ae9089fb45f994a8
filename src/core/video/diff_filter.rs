use std::path::PathBuf;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::frame::{FrameSource, RegionSignature};
use crate::core::config::{ExtractionConfig, RegionOfInterest};

/// 和弦标签发生变化的帧
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub frame_index: usize,
    pub timestamp: f64,
    pub frame_path: PathBuf,
}

/// 一次检测的结果。events 为空表示没有超过阈值的变化，由调用方决定如何处理
#[derive(Debug, Clone, Default)]
pub struct DetectionOutcome {
    pub events: Vec<ChangeEvent>,
    pub frames_seen: usize,
    pub frames_skipped: usize,
}

impl DetectionOutcome {
    pub fn has_changes(&self) -> bool {
        !self.events.is_empty()
    }

    /// 第一帧之后、真正超过阈值的变化数。为 0 表示整段视频的标签区域没有变化
    pub fn changes_above_threshold(&self) -> usize {
        self.events.len().saturating_sub(1)
    }
}

/// 标签区域帧差检测 + 去抖
///
/// 每帧都与紧邻的上一帧比较（不是与上一次变化帧比较），
/// 缓慢的亮度漂移可能累积越过阈值，去抖只防止短时间内的反复触发。
pub struct ChangeDetector {
    threshold: f64,
    debounce_frames: usize,
    region: RegionOfInterest,
    last_signature: Option<RegionSignature>,
    last_change_index: Option<usize>,
}

impl ChangeDetector {
    pub fn new(threshold: f64, debounce_frames: usize) -> Self {
        Self {
            threshold,
            debounce_frames,
            region: RegionOfInterest::default(),
            last_signature: None,
            last_change_index: None,
        }
    }

    pub fn with_config(config: &ExtractionConfig) -> Self {
        Self {
            region: config.region,
            ..Self::new(config.change_threshold, config.debounce_frames)
        }
    }

    /// 输入下一帧的签名，返回该帧是否为变化帧。第一帧总是变化帧。
    pub fn observe(&mut self, index: usize, signature: RegionSignature) -> bool {
        let is_change = match &self.last_signature {
            None => true,
            Some(prev) => {
                let score = signature.mean_abs_diff(prev);
                let accepted = score > self.threshold && self.outside_debounce(index);
                if score > self.threshold && !accepted {
                    debug!("Frame {}: diff {:.2} suppressed by debounce", index, score);
                }
                accepted
            }
        };

        if is_change {
            self.last_change_index = Some(index);
        }
        self.last_signature = Some(signature);

        is_change
    }

    fn outside_debounce(&self, index: usize) -> bool {
        match self.last_change_index {
            None => true,
            Some(last) => index.saturating_sub(last) >= self.debounce_frames,
        }
    }

    /// 扫描整个帧序列。无法解码的帧直接跳过，不更新比较基准。
    pub fn detect(&mut self, source: &FrameSource) -> DetectionOutcome {
        let mut outcome = DetectionOutcome::default();

        for frame in source.frames() {
            let signature = match frame.signature(&self.region) {
                Ok(sig) => sig,
                Err(e) => {
                    debug!("Skipping unreadable frame {}: {}", frame.index, e);
                    outcome.frames_skipped += 1;
                    continue;
                }
            };
            outcome.frames_seen += 1;

            if self.observe(frame.index, signature) {
                outcome.events.push(ChangeEvent {
                    frame_index: frame.index,
                    timestamp: frame.timestamp,
                    frame_path: frame.path.clone(),
                });
            }
        }

        info!(
            "🎯 Detected {} chord changes out of {} frames ({} unreadable)",
            outcome.events.len(),
            source.len(),
            outcome.frames_skipped
        );
        outcome
    }

    pub fn reset(&mut self) {
        self.last_signature = None;
        self.last_change_index = None;
    }
}
