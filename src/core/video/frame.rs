use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage};
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;

use super::error::FrameError;
use crate::core::config::RegionOfInterest;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

static TRAILING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)$").unwrap());

/// 抽帧结果中的一帧（只保存路径，按需解码）
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: usize,
    pub path: PathBuf,
    /// 秒，index / sample_rate
    pub timestamp: f64,
}

impl Frame {
    pub fn new(index: usize, path: impl Into<PathBuf>, sample_rate: f64) -> Self {
        Self {
            index,
            path: path.into(),
            timestamp: index as f64 / sample_rate,
        }
    }

    pub fn load(&self) -> Result<DynamicImage, FrameError> {
        image::open(&self.path).map_err(|source| FrameError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    pub fn signature(&self, region: &RegionOfInterest) -> Result<RegionSignature, FrameError> {
        let img = self.load()?;
        Ok(RegionSignature::from_image(&img, region))
    }
}

/// 有序帧序列，来自抽帧目录
#[derive(Debug, Clone, Default)]
pub struct FrameSource {
    frames: Vec<Frame>,
}

impl FrameSource {
    /// 读取目录下的图片，按文件名末尾的编号排序
    pub fn from_dir(dir: impl AsRef<Path>, sample_rate: f64) -> Result<Self, FrameError> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && is_image(&path) {
                paths.push(path);
            }
        }

        paths.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
        info!("📂 Found {} frames in {:?}", paths.len(), dir);

        Ok(Self::from_paths(paths, sample_rate))
    }

    /// 按给定顺序构建，不重新排序
    pub fn from_paths<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>, sample_rate: f64) -> Self {
        let frames = paths
            .into_iter()
            .enumerate()
            .map(|(i, p)| Frame::new(i, p, sample_rate))
            .collect();
        Self { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// frame_0002 排在 frame_0010 之前，超过补零宽度也成立
fn sort_key(path: &Path) -> (u64, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let number = TRAILING_NUMBER
        .captures(&stem)
        .and_then(|c| c[1].parse::<u64>().ok())
        .unwrap_or(u64::MAX);
    (number, stem)
}

/// 区域签名：标签区域的灰度像素，仅用于相邻帧比较
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSignature {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RegionSignature {
    pub fn from_image(img: &DynamicImage, region: &RegionOfInterest) -> Self {
        let (x, y, w, h) = region.to_pixels(img.width(), img.height());
        let cropped = img.crop_imm(x, y, w, h).to_rgba8();
        let pixels = cropped
            .as_raw()
            .chunks_exact(4)
            .map(|rgba| {
                ((rgba[0] as u32 * 299 + rgba[1] as u32 * 587 + rgba[2] as u32 * 114) / 1000) as u8
            })
            .collect();

        Self {
            width: cropped.width(),
            height: cropped.height(),
            pixels,
        }
    }

    pub fn uniform(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![value; (width * height) as usize],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn resize_to(&self, target_width: u32, target_height: u32) -> RegionSignature {
        let img = match GrayImage::from_raw(self.width, self.height, self.pixels.clone()) {
            Some(img) => img,
            None => return self.clone(),
        };
        let resized = image::imageops::resize(
            &img,
            target_width,
            target_height,
            image::imageops::FilterType::Triangle,
        );

        RegionSignature {
            width: target_width,
            height: target_height,
            pixels: resized.into_raw(),
        }
    }

    /// 平均绝对灰度差；尺寸不同时先把 self 缩放到 other 的尺寸
    pub fn mean_abs_diff(&self, other: &RegionSignature) -> f64 {
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }

        if (self.width, self.height) != (other.width, other.height) {
            debug!(
                "Region size changed {}x{} -> {}x{}, resampling",
                other.width, other.height, self.width, self.height
            );
            return self.resize_to(other.width, other.height).mean_abs_diff(other);
        }

        let total: u64 = self
            .pixels
            .iter()
            .zip(other.pixels.iter())
            .map(|(&a, &b)| (a as i16 - b as i16).unsigned_abs() as u64)
            .sum();
        total as f64 / self.pixels.len() as f64
    }
}
