use log::{info, warn};
use rayon::prelude::*;

use super::parser::{parse_observations, preview};
use super::prompt::INSTRUCTION;
use super::{VisionAnnotator, VisionError};
use crate::core::config::ExtractionConfig;
use crate::core::video::ChangeEvent;
use crate::models::chord::{AnnotatedEvent, FrameObservation};

/// 单个批次的识别结果
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub batch_number: usize,
    pub events: Vec<AnnotatedEvent>,
    pub parse_failed: bool,
}

/// 全部批次按原顺序合并后的结果
#[derive(Debug, Clone, Default)]
pub struct AnnotationOutcome {
    pub events: Vec<AnnotatedEvent>,
    pub batches: usize,
    /// 解析失败的批次编号（从 1 开始）
    pub failed_batches: Vec<usize>,
}

pub struct BatchAnnotator<'a> {
    annotator: &'a dyn VisionAnnotator,
    batch_size: usize,
    parallel: bool,
    max_parallel: usize,
}

impl<'a> BatchAnnotator<'a> {
    pub fn new(annotator: &'a dyn VisionAnnotator, batch_size: usize) -> Self {
        Self {
            annotator,
            batch_size: batch_size.max(1),
            parallel: false,
            max_parallel: 1,
        }
    }

    pub fn with_config(annotator: &'a dyn VisionAnnotator, config: &ExtractionConfig) -> Self {
        Self {
            parallel: config.parallel_batches,
            max_parallel: config.max_parallel_batches.max(1),
            ..Self::new(annotator, config.batch_size)
        }
    }

    /// 分批调用视觉模型。传输错误直接返回；解析失败的批次用占位结果代替。
    pub fn annotate_all(&self, events: &[ChangeEvent]) -> Result<AnnotationOutcome, VisionError> {
        let total_batches = events.len().div_ceil(self.batch_size);

        let results: Vec<BatchResult> = if self.parallel && total_batches > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.max_parallel.min(total_batches))
                .build()?;
            pool.install(|| {
                events
                    .par_chunks(self.batch_size)
                    .enumerate()
                    .map(|(i, batch)| self.annotate_batch(i + 1, total_batches, batch, events.len()))
                    .collect::<Result<Vec<_>, _>>()
            })?
        } else {
            events
                .chunks(self.batch_size)
                .enumerate()
                .map(|(i, batch)| self.annotate_batch(i + 1, total_batches, batch, events.len()))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut outcome = AnnotationOutcome {
            batches: results.len(),
            ..Default::default()
        };
        for result in results {
            if result.parse_failed {
                outcome.failed_batches.push(result.batch_number);
            }
            outcome.events.extend(result.events);
        }
        Ok(outcome)
    }

    fn annotate_batch(
        &self,
        batch_number: usize,
        total_batches: usize,
        batch: &[ChangeEvent],
        total_events: usize,
    ) -> Result<BatchResult, VisionError> {
        let start = (batch_number - 1) * self.batch_size;
        info!(
            "  Batch {}/{}: frames {}-{} of {}",
            batch_number,
            total_batches,
            start + 1,
            start + batch.len(),
            total_events
        );

        let raw = self.annotator.annotate(INSTRUCTION, batch)?;
        Ok(match parse_observations(&raw) {
            Ok(observations) => BatchResult {
                batch_number,
                events: reattach(batch, observations),
                parse_failed: false,
            },
            Err(e) => {
                warn!(
                    "⚠️ Batch {}: JSON parse failed ({}). Raw: {}",
                    batch_number,
                    e,
                    preview(&raw, 300)
                );
                BatchResult {
                    batch_number,
                    events: placeholders(batch),
                    parse_failed: true,
                }
            }
        })
    }
}

/// 按位置回填：多余的结果忽略，不足的位置直接丢弃
pub fn reattach(batch: &[ChangeEvent], observations: Vec<FrameObservation>) -> Vec<AnnotatedEvent> {
    if observations.len() != batch.len() {
        warn!(
            "Vision returned {} results for {} frames",
            observations.len(),
            batch.len()
        );
    }
    batch
        .iter()
        .zip(observations)
        .map(|(source, obs)| AnnotatedEvent::from_observation(source, obs))
        .collect()
}

pub fn placeholders(batch: &[ChangeEvent]) -> Vec<AnnotatedEvent> {
    batch.iter().map(AnnotatedEvent::placeholder).collect()
}
