// Folder reconciliation
//
// Aligns the stored records for one folder with what is on disk:
// deleted files are dropped, new and modified files are (re)extracted and
// written back in one batch, then the store-wide "new" flag aging sweep runs.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rayon::prelude::*;
use serde::Serialize;

use crate::config::ExplorerConfig;
use crate::constants::MS_PER_DAY;
use crate::db::schema::VideoRecord;
use crate::error::{Result, VideoExplorerError};
use crate::metadata::{extract_metadata, MediaProbe, ThumbOptions};
use crate::scan::{absolute_path, list_video_files, ScannedFile};
use crate::settings::get_new_file_duration_days;
use crate::store::VideoStore;

/// Counts of what a single reconcile call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileStats {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    /// Store-wide, not limited to the reconciled folder
    pub aged_out: usize,
}

#[derive(Debug, Clone)]
pub struct ReconcileResult {
    pub videos: Vec<VideoRecord>,
    pub stats: ReconcileStats,
}

enum Staged<'a> {
    New(&'a ScannedFile),
    Changed(&'a ScannedFile, &'a VideoRecord),
}

pub struct ReconcileEngine {
    store: Arc<VideoStore>,
    probe: Arc<dyn MediaProbe>,
    pool: rayon::ThreadPool,
    thumb_options: ThumbOptions,
    folder_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ReconcileEngine {
    pub fn new(store: Arc<VideoStore>, probe: Arc<dyn MediaProbe>, config: &ExplorerConfig) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.extract_workers.max(1))
            .thread_name(|i| format!("extract-{}", i))
            .build()
            .map_err(|e| VideoExplorerError::Other(format!("Failed to start extraction pool: {}", e)))?;

        Ok(Self {
            store,
            probe,
            pool,
            thumb_options: ThumbOptions {
                max_width: config.thumbnail_max_width,
                quality: config.thumbnail_quality,
                ..ThumbOptions::default()
            },
            folder_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Reconcile `folder` against the store using the current wall clock.
    pub fn reconcile(&self, folder: &Path) -> Result<ReconcileResult> {
        self.reconcile_at(folder, chrono::Utc::now().timestamp_millis())
    }

    /// Reconcile `folder` as if the current time were `now_ms`.
    ///
    /// Records are keyed by absolute path, so a relative `folder` is resolved
    /// against the current directory first.
    pub fn reconcile_at(&self, folder: &Path, now_ms: i64) -> Result<ReconcileResult> {
        let folder = absolute_path(folder)?;
        let folder_key = folder.to_string_lossy().to_string();

        let lock = self.folder_lock(&folder_key)?;
        let result = match lock.lock() {
            Ok(_guard) => self.reconcile_locked(&folder, &folder_key, now_ms),
            Err(_) => Err(VideoExplorerError::Other(format!(
                "reconcile lock poisoned for {}",
                folder_key
            ))),
        };
        self.release_folder_lock(&folder_key, lock);
        result
    }

    fn reconcile_locked(&self, folder: &Path, folder_key: &str, now_ms: i64) -> Result<ReconcileResult> {
        let mut stats = ReconcileStats::default();

        let existing: HashMap<String, VideoRecord> = self
            .store
            .get_videos_in_folder(folder_key)?
            .into_iter()
            .map(|v| (v.file_path.clone(), v))
            .collect();

        let live = list_video_files(folder)?;
        let live_paths: HashMap<String, &ScannedFile> =
            live.iter().map(|f| (f.path_string(), f)).collect();

        // Deleted: stored but no longer on disk
        let mut deleted_paths: Vec<String> = existing
            .keys()
            .filter(|path| !live_paths.contains_key(*path))
            .cloned()
            .collect();
        deleted_paths.sort();
        for path in &deleted_paths {
            log::debug!("Deleted: {}", path);
        }
        stats.deleted = self.store.delete_videos_by_paths(&deleted_paths)?;

        // New and changed files get (re)extracted
        let mut staged = Vec::new();
        for (path, file) in &live_paths {
            match existing.get(path) {
                None => {
                    log::debug!("New: {}", path);
                    staged.push(Staged::New(*file));
                }
                Some(record) if record.date_modified != file.modified_ms => {
                    log::debug!("Changed: {} ({} -> {})", path, record.date_modified, file.modified_ms);
                    staged.push(Staged::Changed(*file, record));
                }
                Some(_) => {
                    stats.unchanged += 1;
                }
            }
        }

        let probe = self.probe.as_ref();
        let options = &self.thumb_options;
        let records: Vec<VideoRecord> = self.pool.install(|| {
            staged
                .par_iter()
                .map(|item| build_record(probe, options, item, now_ms))
                .collect()
        });

        for item in &staged {
            match item {
                Staged::New(_) => stats.inserted += 1,
                Staged::Changed(..) => stats.updated += 1,
            }
        }
        self.store.upsert_videos(&records)?;

        // Aging sweep covers every folder in the store
        let days = get_new_file_duration_days(&self.store);
        let cutoff = now_ms.saturating_sub(i64::from(days).saturating_mul(MS_PER_DAY));
        stats.aged_out = self.store.mark_old_videos_not_new(cutoff)?;

        let videos = self.store.get_videos_in_folder(folder_key)?;

        log::info!(
            "Reconciled {}: {} inserted, {} updated, {} deleted, {} unchanged, {} aged out",
            folder_key,
            stats.inserted,
            stats.updated,
            stats.deleted,
            stats.unchanged,
            stats.aged_out
        );

        Ok(ReconcileResult { videos, stats })
    }

    fn folder_lock(&self, folder_key: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .folder_locks
            .lock()
            .map_err(|_| VideoExplorerError::Other("folder lock table poisoned".to_string()))?;
        Ok(locks
            .entry(folder_key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// Drop the folder's table entry once no other call holds or awaits it.
    fn release_folder_lock(&self, folder_key: &str, lock: Arc<Mutex<()>>) {
        let Ok(mut locks) = self.folder_locks.lock() else {
            log::error!("Folder lock table poisoned, keeping entry for {}", folder_key);
            return;
        };
        // One reference in the table, one here
        if Arc::strong_count(&lock) == 2 {
            locks.remove(folder_key);
        }
    }
}

fn build_record(probe: &dyn MediaProbe, options: &ThumbOptions, item: &Staged<'_>, now_ms: i64) -> VideoRecord {
    let (file, previous) = match item {
        Staged::New(file) => (*file, None),
        Staged::Changed(file, record) => (*file, Some(*record)),
    };

    let meta = extract_metadata(probe, &file.path, options);

    let mut record = VideoRecord {
        file_path: file.path_string(),
        file_name: file.file_name.clone(),
        folder_path: file.folder_path.clone(),
        file_size: file.size_bytes,
        date_modified: file.modified_ms,
        date_added: now_ms,
        duration_ms: meta.duration_ms,
        rating: 0.0,
        tags: Vec::new(),
        thumbnail: meta.thumbnail,
        play_count: 0,
        last_played: 0,
        is_favorite: false,
        is_new: true,
    };

    // User state survives a content change
    if let Some(prev) = previous {
        record.date_added = prev.date_added;
        record.rating = prev.rating;
        record.tags = prev.tags.clone();
        record.play_count = prev.play_count;
        record.last_played = prev.last_played;
        record.is_favorite = prev.is_favorite;
        record.is_new = prev.is_new;
    }

    record
}
