// Video Explorer - Library Entry Point
//
// Scans device folders for videos, keeps a SQLite library of what it finds
// (duration, thumbnail, rating, tags, play history) and reconciles that
// library with the filesystem on demand.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod format;
pub mod metadata;
pub mod reconcile;
pub mod scan;
pub mod settings;
pub mod store;
pub mod tools;

pub use config::ExplorerConfig;
pub use error::{Result, VideoExplorerError};
pub use metadata::{FfmpegProbe, MediaProbe};
pub use reconcile::{ReconcileEngine, ReconcileResult, ReconcileStats};
pub use store::{StoreEvent, VideoStore};
