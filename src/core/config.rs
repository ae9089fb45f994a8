//! 提取流程配置

use super::error::ChordError;

/// 和弦名标签所在区域，按帧宽高的比例表示 (x1, y1, x2, y2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionOfInterest {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Default for RegionOfInterest {
    /// 右下角和弦名标签
    fn default() -> Self {
        Self {
            x1: 0.82,
            y1: 0.90,
            x2: 1.0,
            y2: 1.0,
        }
    }
}

impl RegionOfInterest {
    /// 换算为给定帧尺寸下的像素矩形 `(x, y, width, height)`
    pub fn to_pixels(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let x1 = ((width as f64 * self.x1) as u32).min(width);
        let y1 = ((height as f64 * self.y1) as u32).min(height);
        let x2 = ((width as f64 * self.x2) as u32).clamp(x1, width);
        let y2 = ((height as f64 * self.y2) as u32).clamp(y1, height);
        (x1, y1, x2 - x1, y2 - y1)
    }

    fn is_valid(&self) -> bool {
        let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        in_unit(self.x1)
            && in_unit(self.y1)
            && in_unit(self.x2)
            && in_unit(self.y2)
            && self.x1 < self.x2
            && self.y1 < self.y2
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// 抽帧频率（帧/秒），只用于计算时间戳
    pub sample_rate: f64,
    /// 区域平均灰度差阈值
    pub change_threshold: f64,
    /// 两次变化之间的最小帧间隔
    pub debounce_frames: usize,
    /// 每次视觉模型调用的帧数
    pub batch_size: usize,
    pub region: RegionOfInterest,
    /// 批次之间可并发调用，结果仍按原顺序合并
    pub parallel_batches: bool,
    pub max_parallel_batches: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 2.0,
            change_threshold: 5.0,
            debounce_frames: 2,
            batch_size: 8,
            region: RegionOfInterest::default(),
            parallel_batches: false,
            max_parallel_batches: num_cpus::get().clamp(1, 4),
        }
    }
}

impl ExtractionConfig {
    /// 和弦切换频繁（一两拍换一次）的曲子
    pub fn for_fast_changes() -> Self {
        Self {
            change_threshold: 4.0,
            debounce_frames: 1,
            ..Self::default()
        }
    }

    /// 压缩严重、字幕闪烁的视频
    pub fn for_noisy_video() -> Self {
        Self {
            change_threshold: 8.0,
            debounce_frames: 3,
            ..Self::default()
        }
    }

    /// 按名称取预设：`fast` / `noisy` / `default`
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "fast" => Some(Self::for_fast_changes()),
            "noisy" => Some(Self::for_noisy_video()),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ChordError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(ChordError::InvalidConfig(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if !self.change_threshold.is_finite() || self.change_threshold < 0.0 {
            return Err(ChordError::InvalidConfig(format!(
                "change threshold must be non-negative, got {}",
                self.change_threshold
            )));
        }
        if self.batch_size == 0 {
            return Err(ChordError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }
        if self.max_parallel_batches == 0 {
            return Err(ChordError::InvalidConfig(
                "max parallel batches must be at least 1".to_string(),
            ));
        }
        if !self.region.is_valid() {
            return Err(ChordError::InvalidConfig(format!(
                "region of interest is empty or outside the frame: {:?}",
                self.region
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.debounce_frames, 2);
        assert!((config.sample_rate - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractionConfig::for_fast_changes().validate().is_ok());
        assert!(ExtractionConfig::for_noisy_video().validate().is_ok());
    }

    #[test]
    fn test_preset_by_name() {
        let fast = ExtractionConfig::preset("fast").expect("fast");
        assert_eq!(fast.change_threshold, 4.0);
        assert_eq!(fast.debounce_frames, 1);
        let noisy = ExtractionConfig::preset("noisy").expect("noisy");
        assert_eq!(noisy.change_threshold, 8.0);
        assert_eq!(noisy.debounce_frames, 3);
        assert_eq!(ExtractionConfig::preset("default").expect("default").change_threshold, 5.0);
        assert!(ExtractionConfig::preset("slow").is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        let zero_batch = ExtractionConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(zero_batch.validate(), Err(ChordError::InvalidConfig(_))));

        let negative = ExtractionConfig {
            change_threshold: -1.0,
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let no_rate = ExtractionConfig {
            sample_rate: 0.0,
            ..Default::default()
        };
        assert!(no_rate.validate().is_err());

        let inverted = ExtractionConfig {
            region: RegionOfInterest {
                x1: 0.9,
                y1: 0.5,
                x2: 0.1,
                y2: 1.0,
            },
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_region_pixels_scale_with_resolution() {
        let region = RegionOfInterest::default();
        assert_eq!(region.to_pixels(100, 100), (82, 90, 18, 10));
        assert_eq!(region.to_pixels(1920, 1080), (1574, 972, 346, 108));
    }
}
