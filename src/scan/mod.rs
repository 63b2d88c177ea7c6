// Filesystem scanner
//
// list_video_files reads a single folder (non-recursive).
// discover::discover_video_folders walks storage roots for folders holding videos.

pub mod discover;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::VIDEO_EXTENSIONS;
use crate::error::{Result, VideoExplorerError};

/// A video file found directly inside a scanned folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub folder_path: String,
    pub size_bytes: i64,
    pub modified_ms: i64,
}

impl ScannedFile {
    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

/// Check if a file is a video based on extension (case-insensitive)
pub fn is_video_file(path: &Path) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e.to_lowercase(),
        None => return false,
    };

    VIDEO_EXTENSIONS.contains(&ext.as_str())
}

/// List the video files directly inside `folder`.
///
/// A folder that does not exist (or is not a directory) has no videos. A
/// folder that exists but cannot be read is an error, so callers never
/// mistake a permission problem for an empty folder.
pub fn list_video_files(folder: &Path) -> Result<Vec<ScannedFile>> {
    let entries = match std::fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) if !folder.is_dir() => {
            log::debug!("{} is not a directory: {}", folder.display(), e);
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(VideoExplorerError::FolderUnreadable(format!(
                "{}: {}",
                folder.display(),
                e
            )))
        }
    };

    let folder_path = folder.to_string_lossy().to_string();
    let mut files = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("Skipping unreadable entry in {}: {}", folder.display(), e);
                continue;
            }
        };

        let path = entry.path();
        if !is_video_file(&path) {
            continue;
        }

        // Follows symlinks, so a link to a video counts as a video
        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        files.push(ScannedFile {
            file_name: entry.file_name().to_string_lossy().to_string(),
            folder_path: folder_path.clone(),
            size_bytes: metadata.len() as i64,
            modified_ms: metadata.modified().map(system_time_to_ms).unwrap_or(0),
            path,
        });
    }

    Ok(files)
}

/// Absolute form of `path`, resolved against the current directory, with
/// `.` segments and trailing separators dropped. `..` is kept as written.
pub fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(joined.components().collect())
}

/// Milliseconds since the Unix epoch; times before the epoch clamp to 0.
pub fn system_time_to_ms(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
