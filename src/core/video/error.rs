use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("图像解码失败 {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{program} 执行失败 ({status}): {stderr}")]
    Sampler {
        program: String,
        status: String,
        stderr: String,
    },
}
