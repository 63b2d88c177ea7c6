// Video Explorer Constants
// Values the scanner, extractor and reconcile engine agree on.

// Paths
pub const APP_DB_DIR: &str = ".video-explorer";
pub const APP_DB_FILENAME: &str = "library.db";

// Video extensions (case-insensitive match)
pub const VIDEO_EXTENSIONS: [&str; 9] = [
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v", "3gp",
];

// Folder discovery
pub const MAX_FOLDER_DEPTH: usize = 10; // path separators in an absolute path

/// Well-known roots walked by folder discovery on a device.
pub const COMMON_VIDEO_ROOTS: [&str; 4] = [
    "/storage/emulated/0/DCIM",
    "/storage/emulated/0/Movies",
    "/storage/emulated/0/Download",
    "/storage/emulated/0/Pictures",
];

/// Mount point prefixes treated as removable / additional storage.
pub const STORAGE_MOUNT_PREFIXES: [&str; 4] = ["/storage", "/media", "/mnt", "/run/media"];

// Thumbnail settings
pub const THUMB_OFFSET_MS: i64 = 1_000;
pub const THUMB_QUALITY: u8 = 80;
pub const THUMB_MAX_WIDTH: u32 = 320;

// Concurrency defaults
pub const DEFAULT_EXTRACT_WORKERS: usize = 2;

// New-file aging
pub const MS_PER_DAY: i64 = 86_400_000;
pub const DEFAULT_NEW_FILE_DAYS: u32 = 7;

// Settings keys
pub const SETTING_NEW_FILE_DAYS: &str = "new_file_duration_days";

// Play history
pub const DEFAULT_HISTORY_LIMIT: i64 = 100;

// Rating domain
pub const MIN_RATING: f32 = 0.0;
pub const MAX_RATING: f32 = 5.0;
