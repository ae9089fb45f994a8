//! 视觉模型边界：批次划分、请求、响应解析与结果回填

pub mod batcher;
pub mod client;
pub mod parser;
pub mod prompt;

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

use crate::core::video::ChangeEvent;

pub use batcher::{AnnotationOutcome, BatchAnnotator};
pub use client::{AnthropicAnnotator, VisionConfig};

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("未设置 ANTHROPIC_API_KEY")]
    MissingApiKey,
    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),
    #[error("视觉模型返回 HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("视觉模型响应中没有文本内容")]
    EmptyResponse,
    #[error("读取帧失败 {path:?}: {source}")]
    FrameRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("线程池创建失败: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("视觉模型调用失败: {0}")]
    Unavailable(String),
}

/// 外部视觉能力：给定一批帧和说明，返回模型原始文本（不保证格式正确）
pub trait VisionAnnotator: Send + Sync {
    fn annotate(&self, instruction: &str, frames: &[ChangeEvent]) -> Result<String, VisionError>;
}

type Responder = Box<dyn Fn(&[ChangeEvent]) -> Result<String, VisionError> + Send + Sync>;

/// 不联网的视觉模型替身，按脚本返回文本
pub struct MockAnnotator {
    responder: Responder,
    calls: AtomicUsize,
}

impl MockAnnotator {
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&[ChangeEvent]) -> Result<String, VisionError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
        }
    }

    /// 每帧的和弦名由 frame_index 决定，返回格式正确的 JSON 数组
    pub fn with_pattern<F>(pattern: F) -> Self
    where
        F: Fn(usize) -> String + Send + Sync + 'static,
    {
        Self::with_responder(move |frames| {
            let items: Vec<serde_json::Value> = frames
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    let chord = pattern(f.frame_index);
                    serde_json::json!({
                        "frame_index": i + 1,
                        "current_chord": chord,
                        "progression": [chord],
                    })
                })
                .collect();
            Ok(serde_json::Value::Array(items).to_string())
        })
    }

    /// 总是返回无法解析的文本
    pub fn malformed() -> Self {
        Self::with_responder(|_| Ok("Sorry, I can't read these frames.".to_string()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VisionAnnotator for MockAnnotator {
    fn annotate(&self, _instruction: &str, frames: &[ChangeEvent]) -> Result<String, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.responder)(frames)
    }
}
