use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::core::video::ChangeEvent;

/// 视觉模型无法解析时使用的占位和弦名
pub const PLACEHOLDER_CHORD: &str = "?";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerPlacement {
    /// 1 = 高音 e, 6 = 低音 E
    pub string: i32,
    pub fret: i32,
}

/// 和弦图：静音弦、空弦、按弦位置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fretboard {
    #[serde(default, deserialize_with = "null_as_default")]
    pub muted: Vec<i32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub open: Vec<i32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fingers: Vec<FingerPlacement>,
}

impl Fretboard {
    pub fn is_empty(&self) -> bool {
        self.muted.is_empty() && self.open.is_empty() && self.fingers.is_empty()
    }
}

/// 视觉模型返回的单帧结果，缺失字段取默认值。
/// 结果按位置对应批次中的帧，模型回传的 frame_index 不参与解析。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FrameObservation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_chord: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub progression: Vec<String>,
    #[serde(default)]
    pub fretboard: Option<Fretboard>,
}

/// 带识别结果的变化帧。时间戳与帧路径总是来自原始 ChangeEvent。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedEvent {
    pub frame_index: usize,
    pub timestamp: f64,
    pub frame_path: PathBuf,
    pub current_chord: String,
    #[serde(default)]
    pub progression: Vec<String>,
    #[serde(default)]
    pub fretboard: Option<Fretboard>,
    #[serde(default)]
    pub parse_error: bool,
}

impl AnnotatedEvent {
    pub fn from_observation(source: &ChangeEvent, observation: FrameObservation) -> Self {
        Self {
            frame_index: source.frame_index,
            timestamp: source.timestamp,
            frame_path: source.frame_path.clone(),
            current_chord: observation.current_chord,
            progression: observation.progression,
            fretboard: observation.fretboard,
            parse_error: false,
        }
    }

    pub fn placeholder(source: &ChangeEvent) -> Self {
        Self {
            frame_index: source.frame_index,
            timestamp: source.timestamp,
            frame_path: source.frame_path.clone(),
            current_chord: PLACEHOLDER_CHORD.to_string(),
            progression: Vec::new(),
            fretboard: None,
            parse_error: true,
        }
    }

    /// 有实际读出的和弦名（非空且不是占位符）
    pub fn has_chord(&self) -> bool {
        !self.current_chord.is_empty() && self.current_chord != PLACEHOLDER_CHORD
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
