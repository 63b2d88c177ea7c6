// Locating the ffmpeg and ffprobe executables
//
// An explicit path in the environment wins. Otherwise a copy shipped next to
// the vidx binary (or in a bin/ folder beside it) is used, and failing that
// the bare name is left for the OS to find on PATH.

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::VideoExplorerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Ffprobe,
    Ffmpeg,
}

impl Tool {
    pub fn name(self) -> &'static str {
        match self {
            Tool::Ffprobe => "ffprobe",
            Tool::Ffmpeg => "ffmpeg",
        }
    }

    fn env_key(self) -> &'static str {
        match self {
            Tool::Ffprobe => "VIDEO_EXPLORER_FFPROBE_PATH",
            Tool::Ffmpeg => "VIDEO_EXPLORER_FFMPEG_PATH",
        }
    }

    /// Wrap a failure message in this tool's error variant.
    pub fn error(self, message: String) -> VideoExplorerError {
        match self {
            Tool::Ffprobe => VideoExplorerError::FFprobe(message),
            Tool::Ffmpeg => VideoExplorerError::FFmpeg(message),
        }
    }

    pub fn path(self) -> PathBuf {
        locate(self.env_key(), self.name())
    }

    /// True when the resolved executable runs `-version` successfully.
    pub fn is_available(self) -> bool {
        Command::new(self.path())
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

fn locate(env_key: &str, name: &str) -> PathBuf {
    if let Some(configured) = env::var_os(env_key).map(PathBuf::from) {
        if configured.is_file() {
            return configured;
        }
        log::warn!("{} is set to {}, which is not a file", env_key, configured.display());
    }

    let file_name = format!("{}{}", name, env::consts::EXE_SUFFIX);
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .and_then(|dir| {
            [dir.join(&file_name), dir.join("bin").join(&file_name)]
                .into_iter()
                .find(|candidate| candidate.is_file())
        })
        .unwrap_or_else(|| PathBuf::from(name))
}
