// Video store
//
// The record store handed to the reconcile engine and to user-facing
// operations. It owns a single SQLite connection (one writer at a time) and
// publishes a StoreEvent to subscribers after every committed write.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::constants::{MAX_RATING, MIN_RATING};
use crate::db::{self, schema};
use crate::db::schema::{CustomTag, PlayHistoryRow, VideoRecord};
use crate::error::{Result, VideoExplorerError};

/// Change notification published after a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// An empty folder list means the change may touch any folder.
    VideosChanged { folders: Vec<String> },
    HistoryChanged,
    CustomTagsChanged,
    SettingChanged { key: String },
}

pub struct VideoStore {
    conn: Mutex<Connection>,
    subscribers: Mutex<Vec<Sender<StoreEvent>>>,
}

impl VideoStore {
    /// Open (or create) the database file and apply migrations.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = db::open_db(db_path)?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = db::open_in_memory_db()?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| VideoExplorerError::Other("video store connection poisoned".to_string()))
    }

    /// Register for change notifications. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Result<Receiver<StoreEvent>> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .map_err(|_| VideoExplorerError::Other("subscriber list poisoned".to_string()))?
            .push(tx);
        Ok(rx)
    }

    fn publish(&self, event: StoreEvent) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            log::error!("Subscriber list poisoned, dropping {:?}", event);
            return;
        };
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn publish_video_change(&self, file_path: &str) -> Result<()> {
        if let Some(video) = self.get_video(file_path)? {
            self.publish(StoreEvent::VideosChanged { folders: vec![video.folder_path] });
        }
        Ok(())
    }

    // ----- Videos -----

    pub fn get_videos_in_folder(&self, folder_path: &str) -> Result<Vec<VideoRecord>> {
        let conn = self.conn()?;
        schema::get_videos_in_folder(&conn, folder_path)
    }

    pub fn get_video(&self, file_path: &str) -> Result<Option<VideoRecord>> {
        let conn = self.conn()?;
        schema::get_video(&conn, file_path)
    }

    pub fn list_known_folders(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        schema::list_folders(&conn)
    }

    /// Insert or replace every record in one transaction.
    pub fn upsert_videos(&self, videos: &[VideoRecord]) -> Result<()> {
        if videos.is_empty() {
            return Ok(());
        }
        {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            for video in videos {
                schema::upsert_video(&tx, video)?;
            }
            tx.commit()?;
        }
        self.publish(StoreEvent::VideosChanged { folders: distinct_folders(videos) });
        Ok(())
    }

    /// Delete the given paths in one transaction. Returns rows removed.
    pub fn delete_videos_by_paths(&self, file_paths: &[String]) -> Result<usize> {
        if file_paths.is_empty() {
            return Ok(0);
        }
        let (deleted, mut folders) = {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            let mut folders = Vec::new();
            for path in file_paths {
                if let Some(video) = schema::get_video(&tx, path)? {
                    if !folders.contains(&video.folder_path) {
                        folders.push(video.folder_path);
                    }
                }
            }
            let deleted = schema::delete_videos_by_paths(&tx, file_paths)?;
            tx.commit()?;
            (deleted, folders)
        };
        if deleted > 0 {
            folders.sort();
            self.publish(StoreEvent::VideosChanged { folders });
        }
        Ok(deleted)
    }

    /// Store-wide aging sweep. Returns how many videos lost the new flag.
    pub fn mark_old_videos_not_new(&self, cutoff_ms: i64) -> Result<usize> {
        let changed = {
            let conn = self.conn()?;
            schema::mark_old_videos_not_new(&conn, cutoff_ms)?
        };
        if changed > 0 {
            self.publish(StoreEvent::VideosChanged { folders: Vec::new() });
        }
        Ok(changed)
    }

    pub fn update_rating(&self, file_path: &str, rating: f32) -> Result<()> {
        if !rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(VideoExplorerError::InvalidArgument(format!(
                "rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, rating
            )));
        }
        let changed = {
            let conn = self.conn()?;
            schema::update_rating(&conn, file_path, rating)?
        };
        if changed == 0 {
            return Err(VideoExplorerError::VideoNotFound(file_path.to_string()));
        }
        self.publish_video_change(file_path)
    }

    pub fn update_tags(&self, file_path: &str, tags: &[String]) -> Result<()> {
        let changed = {
            let conn = self.conn()?;
            schema::update_tags(&conn, file_path, tags)?
        };
        if changed == 0 {
            return Err(VideoExplorerError::VideoNotFound(file_path.to_string()));
        }
        self.publish_video_change(file_path)
    }

    /// Flip the favorite flag. Returns the new value.
    pub fn toggle_favorite(&self, file_path: &str) -> Result<bool> {
        let favorite = {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            let video = schema::get_video(&tx, file_path)?
                .ok_or_else(|| VideoExplorerError::VideoNotFound(file_path.to_string()))?;
            let favorite = !video.is_favorite;
            schema::set_favorite(&tx, file_path, favorite)?;
            tx.commit()?;
            favorite
        };
        self.publish_video_change(file_path)?;
        Ok(favorite)
    }

    /// Append a play history entry and bump the video's play statistics.
    pub fn record_play(&self, file_path: &str, played_at: i64) -> Result<i64> {
        let (history_id, folder) = {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            let video = schema::get_video(&tx, file_path)?
                .ok_or_else(|| VideoExplorerError::VideoNotFound(file_path.to_string()))?;
            let id = schema::insert_play_history(&tx, file_path, played_at, video.duration_ms)?;
            schema::increment_play_count(&tx, file_path, played_at)?;
            tx.commit()?;
            (id, video.folder_path)
        };
        self.publish(StoreEvent::HistoryChanged);
        self.publish(StoreEvent::VideosChanged { folders: vec![folder] });
        Ok(history_id)
    }

    // ----- Play history -----

    pub fn play_history(&self, limit: i64) -> Result<Vec<PlayHistoryRow>> {
        let conn = self.conn()?;
        schema::list_play_history(&conn, limit)
    }

    // ----- Custom tags -----

    pub fn add_custom_tag(&self, tag_name: &str, color: &str, created_at: i64) -> Result<()> {
        let tag_name = tag_name.trim();
        if tag_name.is_empty() {
            return Err(VideoExplorerError::InvalidArgument("tag name is empty".to_string()));
        }
        {
            let conn = self.conn()?;
            schema::insert_custom_tag(&conn, &CustomTag {
                tag_name: tag_name.to_string(),
                color: color.to_string(),
                created_at,
            })?;
        }
        self.publish(StoreEvent::CustomTagsChanged);
        Ok(())
    }

    pub fn list_custom_tags(&self) -> Result<Vec<CustomTag>> {
        let conn = self.conn()?;
        schema::list_custom_tags(&conn)
    }

    pub fn delete_custom_tag(&self, tag_name: &str) -> Result<bool> {
        let deleted = {
            let conn = self.conn()?;
            schema::delete_custom_tag(&conn, tag_name)?
        };
        if deleted {
            self.publish(StoreEvent::CustomTagsChanged);
        }
        Ok(deleted)
    }

    // ----- Settings -----

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        schema::get_setting(&conn, key)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        {
            let conn = self.conn()?;
            schema::set_setting(&conn, key, value)?;
        }
        self.publish(StoreEvent::SettingChanged { key: key.to_string() });
        Ok(())
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let deleted = {
            let conn = self.conn()?;
            schema::delete_setting(&conn, key)?
        };
        if deleted {
            self.publish(StoreEvent::SettingChanged { key: key.to_string() });
        }
        Ok(deleted)
    }
}

fn distinct_folders(videos: &[VideoRecord]) -> Vec<String> {
    let mut folders: Vec<String> = videos.iter().map(|v| v.folder_path.clone()).collect();
    folders.sort();
    folders.dedup();
    folders
}
