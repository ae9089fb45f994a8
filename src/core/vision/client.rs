use std::fs;
use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, info};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::prompt::frame_label;
use super::{VisionAnnotator, VisionError};
use crate::core::video::ChangeEvent;

pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-6";

#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub endpoint: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl VisionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: "2023-06-01".to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// ANTHROPIC_API_KEY 必填；CHORD_VISION_MODEL / CHORD_VISION_ENDPOINT 可选
    pub fn from_env() -> Result<Self, VisionError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(VisionError::MissingApiKey)?;

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("CHORD_VISION_MODEL") {
            config.model = model;
        }
        if let Ok(endpoint) = std::env::var("CHORD_VISION_ENDPOINT") {
            config.endpoint = endpoint;
        }
        Ok(config)
    }
}

/// Anthropic Messages API 视觉调用
pub struct AnthropicAnnotator {
    client: Client,
    config: VisionConfig,
}

impl AnthropicAnnotator {
    pub fn new(config: VisionConfig) -> Result<Self, VisionError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        info!("👁️ Vision client ready (model: {})", config.model);
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, VisionError> {
        Self::new(VisionConfig::from_env()?)
    }

    fn build_request_body(&self, instruction: &str, frames: &[ChangeEvent]) -> Result<Value, VisionError> {
        let mut content = vec![json!({ "type": "text", "text": instruction })];

        for (position, frame) in frames.iter().enumerate() {
            let bytes = fs::read(&frame.frame_path).map_err(|source| VisionError::FrameRead {
                path: frame.frame_path.clone(),
                source,
            })?;

            content.push(json!({ "type": "text", "text": frame_label(position, frame) }));
            content.push(json!({
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": media_type(&frame.frame_path),
                    "data": STANDARD.encode(bytes),
                }
            }));
        }

        Ok(json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [{ "role": "user", "content": content }],
        }))
    }
}

impl VisionAnnotator for AnthropicAnnotator {
    fn annotate(&self, instruction: &str, frames: &[ChangeEvent]) -> Result<String, VisionError> {
        let body = self.build_request_body(instruction, frames)?;
        debug!("Sending {} frames to {}", frames.len(), self.config.endpoint);

        let resp = self
            .client
            .post(&self.config.endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&body)
            .send()
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(VisionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let message: MessagesResponse = resp.json()?;
        message.first_text().ok_or(VisionError::EmptyResponse)
    }
}

/// 连接失败或超时归为服务不可用，其余保留原始 reqwest 错误
fn transport_error(e: reqwest::Error) -> VisionError {
    if e.is_connect() || e.is_timeout() {
        VisionError::Unavailable(e.to_string())
    } else {
        VisionError::Http(e)
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    fn first_text(self) -> Option<String> {
        self.content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
    }
}

fn media_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_config_defaults() {
        let config = VisionConfig::new("sk-test");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_media_type() {
        assert_eq!(media_type(Path::new("a/frame_0001.jpg")), "image/jpeg");
        assert_eq!(media_type(Path::new("frame.PNG")), "image/png");
        assert_eq!(media_type(Path::new("frame.bmp")), "image/bmp");
    }

    #[test]
    fn test_request_body_layout() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut frames = Vec::new();
        for i in 0..2 {
            let path = dir.path().join(format!("frame_{:04}.jpg", i + 1));
            fs::write(&path, [0xFFu8, 0xD8, 0xFF, i as u8]).expect("write frame");
            frames.push(ChangeEvent {
                frame_index: i * 10,
                timestamp: (i * 10) as f64 / 2.0,
                frame_path: path,
            });
        }

        let annotator = AnthropicAnnotator::new(VisionConfig::new("sk-test")).expect("client");
        let body = annotator
            .build_request_body("instruction", &frames)
            .expect("build body");

        let content = body["messages"][0]["content"].as_array().expect("content");
        assert_eq!(content.len(), 1 + 2 * 2);
        assert_eq!(content[0]["text"], "instruction");
        assert_eq!(content[3]["text"], "Frame 2 (at 0:00:05):");
        assert_eq!(content[4]["source"]["media_type"], "image/jpeg");
        assert_eq!(content[4]["source"]["data"], STANDARD.encode([0xFFu8, 0xD8, 0xFF, 1]));
        assert_eq!(body["model"], DEFAULT_MODEL);
    }

    #[test]
    fn test_missing_frame_file() {
        let annotator = AnthropicAnnotator::new(VisionConfig::new("sk-test")).expect("client");
        let frames = vec![ChangeEvent {
            frame_index: 0,
            timestamp: 0.0,
            frame_path: PathBuf::from("/nonexistent/frame_0001.jpg"),
        }];
        let result = annotator.build_request_body("instruction", &frames);
        assert!(matches!(result, Err(VisionError::FrameRead { .. })));
    }

    #[test]
    fn test_unreachable_endpoint_is_unavailable() {
        let mut config = VisionConfig::new("sk-test");
        config.endpoint = "http://127.0.0.1:1/v1/messages".to_string();
        config.timeout = Duration::from_secs(5);
        let annotator = AnthropicAnnotator::new(config).expect("client");

        let result = annotator.annotate("instruction", &[]);
        assert!(matches!(result, Err(VisionError::Unavailable(_))));
    }

    #[test]
    fn test_first_text_block() {
        let resp: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"thinking","thinking":"..."},{"type":"text","text":"[]"}]}"#,
        )
        .expect("parse");
        assert_eq!(resp.first_text().as_deref(), Some("[]"));

        let empty: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).expect("parse");
        assert!(empty.first_text().is_none());
    }
}
