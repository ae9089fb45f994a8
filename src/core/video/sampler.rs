//! 抽帧 / 下载：调用外部 ffmpeg 与 yt-dlp

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use log::{debug, info};

use super::error::FrameError;

/// 按 fps 抽帧到 out_dir/frame_%04d.jpg，返回帧数
pub fn extract_frames(video: &Path, out_dir: &Path, fps: f64) -> Result<usize, FrameError> {
    fs::create_dir_all(out_dir)?;

    let pattern = out_dir.join("frame_%04d.jpg");
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-y")
        .arg("-i")
        .arg(video)
        .arg("-vf")
        .arg(format!("fps={}", fps))
        .arg("-q:v")
        .arg("2")
        .arg(&pattern);
    run("ffmpeg", &mut cmd)?;

    let count = count_frames(out_dir)?;
    info!("🎞️ Extracted {} frames at {} fps", count, fps);
    Ok(count)
}

pub fn download_video(url: &str, dest: &Path) -> Result<(), FrameError> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    info!("⬇️ Downloading {}", url);
    let mut cmd = Command::new("yt-dlp");
    cmd.arg("-f")
        .arg("best[height<=1080]")
        .arg("-o")
        .arg(dest)
        .arg(url);
    run("yt-dlp", &mut cmd)?;
    Ok(())
}

pub fn is_remote(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

fn count_frames(dir: &Path) -> Result<usize, FrameError> {
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("frame_") && name.ends_with(".jpg") {
            count += 1;
        }
    }
    Ok(count)
}

fn run(program: &str, cmd: &mut Command) -> Result<Output, FrameError> {
    debug!("Running {:?}", cmd);
    let output = cmd.output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().collect();
        return Err(FrameError::Sampler {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: lines[lines.len().saturating_sub(5)..].join("\n"),
        });
    }
    Ok(output)
}
