// Database schema types and query helpers

use rusqlite::{Connection, params, OptionalExtension};
use serde::{Deserialize, Serialize};
use crate::error::Result;

// ----- Videos -----

/// A known video file. The absolute path is the identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub file_path: String,
    pub file_name: String,
    pub folder_path: String,
    pub file_size: i64,
    pub date_modified: i64,
    pub date_added: i64,
    /// 0 when extraction failed
    pub duration_ms: i64,
    pub rating: f32,
    pub tags: Vec<String>,
    #[serde(skip)]
    pub thumbnail: Option<Vec<u8>>,
    pub play_count: i64,
    pub last_played: i64,
    pub is_favorite: bool,
    pub is_new: bool,
}

const VIDEO_COLUMNS: &str = "file_path, file_name, folder_path, file_size, date_modified, date_added, \
     duration_ms, rating, tags, thumbnail, play_count, last_played, is_favorite, is_new";

fn map_video(row: &rusqlite::Row) -> rusqlite::Result<VideoRecord> {
    let file_path: String = row.get(0)?;
    let tags_json: String = row.get(8)?;
    let tags = decode_tags(&file_path, &tags_json);
    Ok(VideoRecord {
        file_path,
        file_name: row.get(1)?,
        folder_path: row.get(2)?,
        file_size: row.get(3)?,
        date_modified: row.get(4)?,
        date_added: row.get(5)?,
        duration_ms: row.get(6)?,
        rating: row.get(7)?,
        tags,
        thumbnail: row.get(9)?,
        play_count: row.get(10)?,
        last_played: row.get(11)?,
        is_favorite: row.get(12)?,
        is_new: row.get(13)?,
    })
}

/// Stored tags are a JSON array; anything else reads back as no tags.
pub fn decode_tags(file_path: &str, tags_json: &str) -> Vec<String> {
    if tags_json.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<String>>(tags_json) {
        Ok(tags) => tags,
        Err(e) => {
            log::warn!("Unparsable tags for {}: {}", file_path, e);
            Vec::new()
        }
    }
}

pub fn encode_tags(tags: &[String]) -> Result<String> {
    Ok(serde_json::to_string(tags)?)
}

pub fn get_videos_in_folder(conn: &Connection, folder_path: &str) -> Result<Vec<VideoRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM videos WHERE folder_path = ?1 ORDER BY file_name, file_path",
        VIDEO_COLUMNS
    ))?;
    let videos = stmt.query_map(params![folder_path], map_video)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(videos)
}

pub fn get_video(conn: &Connection, file_path: &str) -> Result<Option<VideoRecord>> {
    let result = conn.query_row(
        &format!("SELECT {} FROM videos WHERE file_path = ?1", VIDEO_COLUMNS),
        params![file_path],
        map_video,
    ).optional()?;
    Ok(result)
}

/// Insert or replace by primary key.
pub fn upsert_video(conn: &Connection, video: &VideoRecord) -> Result<()> {
    let tags = encode_tags(&video.tags)?;
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO videos ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            VIDEO_COLUMNS
        ),
        params![
            video.file_path,
            video.file_name,
            video.folder_path,
            video.file_size,
            video.date_modified,
            video.date_added,
            video.duration_ms,
            video.rating,
            tags,
            video.thumbnail,
            video.play_count,
            video.last_played,
            video.is_favorite,
            video.is_new,
        ],
    )?;
    Ok(())
}

pub fn delete_videos_by_paths(conn: &Connection, file_paths: &[String]) -> Result<usize> {
    let mut stmt = conn.prepare("DELETE FROM videos WHERE file_path = ?1")?;
    let mut deleted = 0;
    for path in file_paths {
        deleted += stmt.execute(params![path])?;
    }
    Ok(deleted)
}

/// Clear the new flag on every video added at or before the cutoff.
/// Returns how many videos changed.
pub fn mark_old_videos_not_new(conn: &Connection, cutoff_ms: i64) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE videos SET is_new = 0 WHERE is_new = 1 AND date_added <= ?1",
        params![cutoff_ms],
    )?;
    Ok(changed)
}

pub fn list_folders(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT folder_path FROM videos ORDER BY folder_path")?;
    let folders = stmt.query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(folders)
}

pub fn update_rating(conn: &Connection, file_path: &str, rating: f32) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE videos SET rating = ?1 WHERE file_path = ?2",
        params![rating, file_path],
    )?;
    Ok(changed)
}

pub fn update_tags(conn: &Connection, file_path: &str, tags: &[String]) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE videos SET tags = ?1 WHERE file_path = ?2",
        params![encode_tags(tags)?, file_path],
    )?;
    Ok(changed)
}

pub fn set_favorite(conn: &Connection, file_path: &str, favorite: bool) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE videos SET is_favorite = ?1 WHERE file_path = ?2",
        params![favorite, file_path],
    )?;
    Ok(changed)
}

pub fn increment_play_count(conn: &Connection, file_path: &str, played_at: i64) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE videos SET play_count = play_count + 1, last_played = ?1 WHERE file_path = ?2",
        params![played_at, file_path],
    )?;
    Ok(changed)
}

// ----- Play history -----

/// A history entry joined with the video's current name.
/// `file_name` is None once the video record is gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayHistoryRow {
    pub id: i64,
    pub file_path: String,
    pub played_at: i64,
    pub duration_ms: i64,
    pub file_name: Option<String>,
}

pub fn insert_play_history(conn: &Connection, file_path: &str, played_at: i64, duration_ms: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO play_history (file_path, played_at, duration_ms) VALUES (?1, ?2, ?3)",
        params![file_path, played_at, duration_ms],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_play_history(conn: &Connection, limit: i64) -> Result<Vec<PlayHistoryRow>> {
    let mut stmt = conn.prepare(
        "SELECT ph.id, ph.file_path, ph.played_at, ph.duration_ms, v.file_name
         FROM play_history ph
         LEFT JOIN videos v ON ph.file_path = v.file_path
         ORDER BY ph.played_at DESC, ph.id DESC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok(PlayHistoryRow {
            id: row.get(0)?,
            file_path: row.get(1)?,
            played_at: row.get(2)?,
            duration_ms: row.get(3)?,
            file_name: row.get(4)?,
        })
    })?.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ----- Custom tags -----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTag {
    pub tag_name: String,
    pub color: String,
    pub created_at: i64,
}

pub fn insert_custom_tag(conn: &Connection, tag: &CustomTag) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO custom_tags (tag_name, color, created_at) VALUES (?1, ?2, ?3)",
        params![tag.tag_name, tag.color, tag.created_at],
    )?;
    Ok(())
}

pub fn list_custom_tags(conn: &Connection) -> Result<Vec<CustomTag>> {
    let mut stmt = conn.prepare("SELECT tag_name, color, created_at FROM custom_tags ORDER BY tag_name")?;
    let tags = stmt.query_map([], |row| {
        Ok(CustomTag {
            tag_name: row.get(0)?,
            color: row.get(1)?,
            created_at: row.get(2)?,
        })
    })?.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(tags)
}

pub fn delete_custom_tag(conn: &Connection, tag_name: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM custom_tags WHERE tag_name = ?1", params![tag_name])?;
    Ok(deleted > 0)
}

// ----- App settings (KV) -----

/// Get a setting value by key. Returns None if not set.
pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn.query_row(
        "SELECT value FROM app_settings WHERE key = ?1",
        [key],
        |row| row.get(0),
    ).optional()?;
    Ok(value)
}

/// Set a setting value (upsert).
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO app_settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Delete a setting by key.
pub fn delete_setting(conn: &Connection, key: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM app_settings WHERE key = ?1", [key])?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Connection {
        crate::db::open_in_memory_db().unwrap()
    }

    fn sample_video(path: &str, folder: &str) -> VideoRecord {
        VideoRecord {
            file_path: path.to_string(),
            file_name: path.rsplit('/').next().unwrap().to_string(),
            folder_path: folder.to_string(),
            file_size: 1024,
            date_modified: 1_000,
            date_added: 2_000,
            duration_ms: 5_000,
            rating: 0.0,
            tags: Vec::new(),
            thumbnail: Some(vec![0xFF, 0xD8, 0xFF]),
            play_count: 0,
            last_played: 0,
            is_favorite: false,
            is_new: true,
        }
    }

    #[test]
    fn test_upsert_and_get_round_trip() {
        let conn = setup_db();
        let mut video = sample_video("/Movies/a.mp4", "/Movies");
        video.tags = vec!["family".to_string(), "beach".to_string()];
        upsert_video(&conn, &video).unwrap();

        let stored = get_video(&conn, "/Movies/a.mp4").unwrap().unwrap();
        assert_eq!(stored, video);
    }

    #[test]
    fn test_upsert_replaces_by_path() {
        let conn = setup_db();
        let mut video = sample_video("/Movies/a.mp4", "/Movies");
        upsert_video(&conn, &video).unwrap();

        video.file_size = 4096;
        video.thumbnail = None;
        upsert_video(&conn, &video).unwrap();

        let all = get_videos_in_folder(&conn, "/Movies").unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].file_size, 4096);
        assert!(all[0].thumbnail.is_none());
    }

    #[test]
    fn test_folder_query_is_scoped_and_ordered() {
        let conn = setup_db();
        upsert_video(&conn, &sample_video("/Movies/b.mp4", "/Movies")).unwrap();
        upsert_video(&conn, &sample_video("/Movies/a.mp4", "/Movies")).unwrap();
        upsert_video(&conn, &sample_video("/DCIM/c.mp4", "/DCIM")).unwrap();

        let movies = get_videos_in_folder(&conn, "/Movies").unwrap();
        let names: Vec<_> = movies.iter().map(|v| v.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.mp4", "b.mp4"]);

        assert_eq!(list_folders(&conn).unwrap(), vec!["/DCIM", "/Movies"]);
    }

    #[test]
    fn test_delete_by_paths_counts_only_existing() {
        let conn = setup_db();
        upsert_video(&conn, &sample_video("/Movies/a.mp4", "/Movies")).unwrap();
        upsert_video(&conn, &sample_video("/Movies/b.mp4", "/Movies")).unwrap();

        let deleted = delete_videos_by_paths(
            &conn,
            &["/Movies/a.mp4".to_string(), "/Movies/missing.mp4".to_string()],
        ).unwrap();
        assert_eq!(deleted, 1);
        assert!(get_video(&conn, "/Movies/a.mp4").unwrap().is_none());
        assert!(get_video(&conn, "/Movies/b.mp4").unwrap().is_some());
    }

    #[test]
    fn test_mark_old_videos_not_new_is_inclusive_and_global() {
        let conn = setup_db();
        let mut old = sample_video("/Movies/old.mp4", "/Movies");
        old.date_added = 100;
        let mut edge = sample_video("/DCIM/edge.mp4", "/DCIM");
        edge.date_added = 500;
        let mut fresh = sample_video("/Movies/fresh.mp4", "/Movies");
        fresh.date_added = 501;
        for v in [&old, &edge, &fresh] {
            upsert_video(&conn, v).unwrap();
        }

        assert_eq!(mark_old_videos_not_new(&conn, 500).unwrap(), 2);
        assert!(!get_video(&conn, "/Movies/old.mp4").unwrap().unwrap().is_new);
        assert!(!get_video(&conn, "/DCIM/edge.mp4").unwrap().unwrap().is_new);
        assert!(get_video(&conn, "/Movies/fresh.mp4").unwrap().unwrap().is_new);

        // Already-aged rows are not counted again
        assert_eq!(mark_old_videos_not_new(&conn, 500).unwrap(), 0);
    }

    #[test]
    fn test_bad_tags_json_reads_as_empty() {
        let conn = setup_db();
        upsert_video(&conn, &sample_video("/Movies/a.mp4", "/Movies")).unwrap();
        conn.execute("UPDATE videos SET tags = 'not json'", []).unwrap();

        let stored = get_video(&conn, "/Movies/a.mp4").unwrap().unwrap();
        assert!(stored.tags.is_empty());
        assert!(decode_tags("x", "").is_empty());
    }

    #[test]
    fn test_play_history_left_join_keeps_orphans() {
        let conn = setup_db();
        upsert_video(&conn, &sample_video("/Movies/a.mp4", "/Movies")).unwrap();
        insert_play_history(&conn, "/Movies/a.mp4", 10, 5_000).unwrap();
        insert_play_history(&conn, "/Movies/gone.mp4", 20, 1_000).unwrap();

        let history = list_play_history(&conn, 100).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].file_path, "/Movies/gone.mp4");
        assert_eq!(history[0].file_name, None);
        assert_eq!(history[1].file_name.as_deref(), Some("a.mp4"));

        assert_eq!(list_play_history(&conn, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_custom_tag_crud() {
        let conn = setup_db();
        insert_custom_tag(&conn, &CustomTag { tag_name: "work".into(), color: "#0000FF".into(), created_at: 1 }).unwrap();
        insert_custom_tag(&conn, &CustomTag { tag_name: "family".into(), color: "#FF0000".into(), created_at: 2 }).unwrap();
        insert_custom_tag(&conn, &CustomTag { tag_name: "work".into(), color: "#00FF00".into(), created_at: 3 }).unwrap();

        let tags = list_custom_tags(&conn).unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].tag_name, "family");
        assert_eq!(tags[1].color, "#00FF00");

        assert!(delete_custom_tag(&conn, "work").unwrap());
        assert!(!delete_custom_tag(&conn, "work").unwrap());
    }

    #[test]
    fn test_settings_kv() {
        let conn = setup_db();
        assert_eq!(get_setting(&conn, "missing").unwrap(), None);
        set_setting(&conn, "k", "v1").unwrap();
        set_setting(&conn, "k", "v2").unwrap();
        assert_eq!(get_setting(&conn, "k").unwrap().as_deref(), Some("v2"));
        assert!(delete_setting(&conn, "k").unwrap());
        assert_eq!(get_setting(&conn, "k").unwrap(), None);
    }
}
