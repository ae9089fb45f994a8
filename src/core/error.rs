use thiserror::Error;

use super::video::FrameError;
use super::vision::VisionError;

#[derive(Error, Debug)]
pub enum ChordError {
    #[error("配置无效: {0}")]
    InvalidConfig(String),
    #[error("未检测到和弦变化 (threshold={threshold})，可尝试降低阈值")]
    NoChangesDetected { threshold: f64 },
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Vision(#[from] VisionError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON 序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}
