// Video Explorer Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VideoExplorerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("FFprobe error: {0}")]
    FFprobe(String),

    #[error("FFmpeg error: {0}")]
    FFmpeg(String),

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("Folder unreadable: {0}")]
    FolderUnreadable(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for VideoExplorerError {
    fn from(err: anyhow::Error) -> Self {
        VideoExplorerError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VideoExplorerError>;
