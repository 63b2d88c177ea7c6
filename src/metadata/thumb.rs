// Thumbnail generation
//
// Grabs a single frame with ffmpeg (PNG over a pipe, nothing touches disk),
// scales it down and re-encodes it as JPEG for storage in the videos table.

use std::path::Path;
use std::process::Command;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageFormat};

use crate::constants::{THUMB_MAX_WIDTH, THUMB_OFFSET_MS, THUMB_QUALITY};
use crate::error::{Result, VideoExplorerError};
use crate::tools::Tool;
use super::process::ProbeProcess;

/// Options for thumbnail generation.
#[derive(Debug, Clone)]
pub struct ThumbOptions {
    pub max_width: u32,
    pub quality: u8,
    pub offset_ms: i64,
}

impl Default for ThumbOptions {
    fn default() -> Self {
        Self {
            max_width: THUMB_MAX_WIDTH,
            quality: THUMB_QUALITY,
            offset_ms: THUMB_OFFSET_MS,
        }
    }
}

/// Decode the frame at `at_ms` from a video file.
pub fn grab_frame(source_path: &Path, at_ms: i64) -> Result<DynamicImage> {
    let seek_time = format_seek(at_ms);

    let mut cmd = Command::new(Tool::Ffmpeg.path());
    cmd.args(["-v", "error", "-ss", &seek_time, "-i"])
        .arg(source_path)
        .args([
            "-frames:v", "1",
            "-f", "image2pipe",
            "-vcodec", "png",
            "pipe:1",
        ]);

    let png = ProbeProcess::spawn(cmd, Tool::Ffmpeg)?.finish()?;
    if png.is_empty() {
        return Err(VideoExplorerError::FFmpeg(format!(
            "No frame at {} in {}",
            seek_time,
            source_path.display()
        )));
    }

    Ok(image::load_from_memory_with_format(&png, ImageFormat::Png)?)
}

/// Scale a frame to at most `max_width` (aspect preserved) and encode as JPEG.
pub fn encode_thumbnail(frame: &DynamicImage, options: &ThumbOptions) -> Result<Vec<u8>> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 {
        return Err(VideoExplorerError::InvalidArgument("empty frame".to_string()));
    }

    let scaled = if options.max_width > 0 && width > options.max_width {
        let new_height = ((height as u64 * options.max_width as u64) / width as u64).max(1) as u32;
        frame.resize_exact(options.max_width, new_height, FilterType::Triangle)
    } else {
        frame.clone()
    };

    let rgb = scaled.to_rgb8();
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, options.quality.clamp(1, 100));
    encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)?;
    Ok(buf)
}

/// Format milliseconds as HH:MM:SS.mmm for ffmpeg.
fn format_seek(ms: i64) -> String {
    let ms = ms.max(0);
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}
