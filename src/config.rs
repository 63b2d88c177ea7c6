// Runtime configuration
//
// Defaults come from constants.rs; environment variables override them.
// The new-file threshold is a user setting stored in the database, not here.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    APP_DB_DIR, APP_DB_FILENAME, COMMON_VIDEO_ROOTS, DEFAULT_EXTRACT_WORKERS, MAX_FOLDER_DEPTH,
    THUMB_MAX_WIDTH, THUMB_QUALITY,
};

pub const ENV_DB_PATH: &str = "VIDEO_EXPLORER_DB";
pub const ENV_ROOTS: &str = "VIDEO_EXPLORER_ROOTS";
pub const ENV_EXTRACT_WORKERS: &str = "VIDEO_EXPLORER_EXTRACT_WORKERS";
pub const ENV_MAX_DEPTH: &str = "VIDEO_EXPLORER_MAX_DEPTH";

#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub db_path: PathBuf,
    pub discovery_roots: Vec<PathBuf>,
    pub max_folder_depth: usize,
    pub extract_workers: usize,
    pub thumbnail_max_width: u32,
    pub thumbnail_quality: u8,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            discovery_roots: COMMON_VIDEO_ROOTS.iter().map(PathBuf::from).collect(),
            max_folder_depth: MAX_FOLDER_DEPTH,
            extract_workers: DEFAULT_EXTRACT_WORKERS,
            thumbnail_max_width: THUMB_MAX_WIDTH,
            thumbnail_quality: THUMB_QUALITY,
        }
    }
}

impl ExplorerConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(path) = env::var_os(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }

        if let Some(roots) = env::var_os(ENV_ROOTS) {
            let roots: Vec<PathBuf> = env::split_paths(&roots)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            if !roots.is_empty() {
                config.discovery_roots = roots;
            }
        }

        if let Some(workers) = parse_env::<usize>(ENV_EXTRACT_WORKERS) {
            config.extract_workers = workers.max(1);
        }

        if let Some(depth) = parse_env::<usize>(ENV_MAX_DEPTH) {
            config.max_folder_depth = depth;
        }

        config
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring unparsable {}={:?}", key, raw);
            None
        }
    }
}

/// Default database location: ~/.video-explorer/library.db
pub fn default_db_path() -> PathBuf {
    match directories::BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(APP_DB_DIR).join(APP_DB_FILENAME),
        None => PathBuf::from(APP_DB_FILENAME),
    }
}
