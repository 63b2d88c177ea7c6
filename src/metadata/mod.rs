// Metadata extraction module
//
// Duration via ffprobe, poster frame via ffmpeg. Extraction is best-effort:
// a file the tools cannot read still gets a record, with duration 0 and no
// thumbnail.

pub mod ffprobe;
pub mod process;
pub mod thumb;

use std::path::Path;

use image::DynamicImage;

use crate::error::Result;

pub use thumb::ThumbOptions;

/// Source of media facts for a video file.
///
/// Implementations must be safe to call from several extraction workers at once.
pub trait MediaProbe: Send + Sync {
    /// Duration in milliseconds.
    fn duration_ms(&self, path: &Path) -> Result<i64>;

    /// A decoded frame at `at_ms` into the video.
    fn frame_at(&self, path: &Path, at_ms: i64) -> Result<DynamicImage>;
}

/// Probe backed by the ffprobe and ffmpeg executables.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegProbe;

impl MediaProbe for FfmpegProbe {
    fn duration_ms(&self, path: &Path) -> Result<i64> {
        ffprobe::probe_duration_ms(path)
    }

    fn frame_at(&self, path: &Path, at_ms: i64) -> Result<DynamicImage> {
        thumb::grab_frame(path, at_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedMetadata {
    pub duration_ms: i64,
    /// JPEG bytes
    pub thumbnail: Option<Vec<u8>>,
}

/// Extract duration and thumbnail for one file. Never fails.
pub fn extract_metadata(probe: &dyn MediaProbe, path: &Path, options: &ThumbOptions) -> ExtractedMetadata {
    let duration_ms = match probe.duration_ms(path) {
        Ok(d) if d > 0 => d,
        Ok(_) => 0,
        Err(e) => {
            log::warn!("Duration unavailable for {}: {}", path.display(), e);
            0
        }
    };

    let at_ms = thumbnail_offset_ms(duration_ms, options.offset_ms);
    let thumbnail = match probe
        .frame_at(path, at_ms)
        .and_then(|frame| thumb::encode_thumbnail(&frame, options))
    {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!("Thumbnail unavailable for {}: {}", path.display(), e);
            None
        }
    };

    log::debug!(
        "Extracted {}: duration={}ms thumbnail={}",
        path.display(),
        duration_ms,
        thumbnail.as_ref().map(|t| t.len()).unwrap_or(0)
    );

    ExtractedMetadata { duration_ms, thumbnail }
}

/// Clips shorter than the offset are sampled from their first frame.
fn thumbnail_offset_ms(duration_ms: i64, offset_ms: i64) -> i64 {
    if duration_ms > 0 && duration_ms <= offset_ms {
        0
    } else {
        offset_ms.max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VideoExplorerError;
    use image::{ImageBuffer, Rgb};
    use std::sync::Mutex;

    struct FakeProbe {
        duration: Option<i64>,
        frame: bool,
        requested_at: Mutex<Vec<i64>>,
    }

    impl FakeProbe {
        fn new(duration: Option<i64>, frame: bool) -> Self {
            Self { duration, frame, requested_at: Mutex::new(Vec::new()) }
        }
    }

    impl MediaProbe for FakeProbe {
        fn duration_ms(&self, _path: &Path) -> Result<i64> {
            self.duration
                .ok_or_else(|| VideoExplorerError::FFprobe("unreadable".to_string()))
        }

        fn frame_at(&self, _path: &Path, at_ms: i64) -> Result<DynamicImage> {
            self.requested_at.lock().unwrap().push(at_ms);
            if !self.frame {
                return Err(VideoExplorerError::FFmpeg("no frame".to_string()));
            }
            Ok(DynamicImage::ImageRgb8(ImageBuffer::from_pixel(640, 480, Rgb([10u8, 20, 30]))))
        }
    }

    #[test]
    fn test_extracts_duration_and_thumbnail() {
        let probe = FakeProbe::new(Some(90_000), true);
        let meta = extract_metadata(&probe, Path::new("a.mp4"), &ThumbOptions::default());

        assert_eq!(meta.duration_ms, 90_000);
        let thumb = meta.thumbnail.expect("thumbnail");
        assert_eq!(&thumb[..2], &[0xFF, 0xD8]);
        assert_eq!(*probe.requested_at.lock().unwrap(), vec![1_000]);
    }

    #[test]
    fn test_unreadable_file_yields_defaults() {
        let probe = FakeProbe::new(None, false);
        let meta = extract_metadata(&probe, Path::new("broken.mp4"), &ThumbOptions::default());
        assert_eq!(meta, ExtractedMetadata { duration_ms: 0, thumbnail: None });
    }

    #[test]
    fn test_thumbnail_survives_duration_failure() {
        let probe = FakeProbe::new(None, true);
        let meta = extract_metadata(&probe, Path::new("a.mp4"), &ThumbOptions::default());
        assert_eq!(meta.duration_ms, 0);
        assert!(meta.thumbnail.is_some());
    }

    #[test]
    fn test_short_clip_uses_first_frame() {
        let probe = FakeProbe::new(Some(400), true);
        extract_metadata(&probe, Path::new("short.mp4"), &ThumbOptions::default());
        assert_eq!(*probe.requested_at.lock().unwrap(), vec![0]);
    }

    #[test]
    fn test_negative_duration_clamps_to_zero() {
        let probe = FakeProbe::new(Some(-5), false);
        let meta = extract_metadata(&probe, Path::new("a.mp4"), &ThumbOptions::default());
        assert_eq!(meta.duration_ms, 0);
    }

    #[test]
    fn test_thumbnail_offset() {
        assert_eq!(thumbnail_offset_ms(0, 1_000), 1_000);
        assert_eq!(thumbnail_offset_ms(999, 1_000), 0);
        assert_eq!(thumbnail_offset_ms(5_000, 1_000), 1_000);
    }
}
