// Database migrations
// Migrations are forward-only. Never edit or delete a migration after it ships.

use rusqlite::Connection;
use anyhow::Result;

/// All migrations in order. Each migration is a SQL string.
const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial schema
    r#"
    -- Known video files, keyed by absolute path
    CREATE TABLE videos (
        file_path TEXT PRIMARY KEY NOT NULL,
        file_name TEXT NOT NULL,
        folder_path TEXT NOT NULL,
        file_size INTEGER NOT NULL,
        date_modified INTEGER NOT NULL,
        date_added INTEGER NOT NULL,
        duration_ms INTEGER NOT NULL DEFAULT 0,
        rating REAL NOT NULL DEFAULT 0,
        tags TEXT NOT NULL DEFAULT '[]',
        thumbnail BLOB,
        play_count INTEGER NOT NULL DEFAULT 0,
        last_played INTEGER NOT NULL DEFAULT 0,
        is_favorite INTEGER NOT NULL DEFAULT 0,
        is_new INTEGER NOT NULL DEFAULT 1
    );

    -- Append-only play log (file_path is a soft reference)
    CREATE TABLE play_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_path TEXT NOT NULL,
        played_at INTEGER NOT NULL,
        duration_ms INTEGER NOT NULL DEFAULT 0
    );

    -- Key-value settings
    CREATE TABLE app_settings (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    );

    -- User-defined tags
    CREATE TABLE custom_tags (
        tag_name TEXT PRIMARY KEY NOT NULL,
        color TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );

    CREATE INDEX idx_videos_folder ON videos(folder_path);
    CREATE INDEX idx_videos_date_added ON videos(date_added);
    CREATE INDEX idx_play_history_played_at ON play_history(played_at);
    CREATE INDEX idx_play_history_path ON play_history(file_path);
    "#,
];

/// Get current schema version from database
fn get_schema_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.query_row(
        "PRAGMA user_version",
        [],
        |row| row.get(0)
    )?;
    Ok(version)
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    let target_version = MIGRATIONS.len() as u32;

    // Refuse to open a DB created by a newer build
    if current_version > target_version {
        anyhow::bail!(
            "Database schema version {} is newer than this build supports (max {}).",
            current_version,
            target_version
        );
    }

    if current_version == target_version {
        return Ok(());
    }

    let was_fresh = current_version == 0;

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as u32;
        if migration_version <= current_version {
            continue;
        }

        conn.execute_batch(migration)?;
        conn.execute_batch(&format!("PRAGMA user_version = {}", migration_version))?;

        log::info!("Applied migration {}", migration_version);
    }

    if was_fresh {
        seed_default_settings(conn)?;
    }

    Ok(())
}

/// Seed default settings for a fresh database.
fn seed_default_settings(conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO app_settings (key, value) VALUES (?1, ?2)",
        rusqlite::params![
            crate::constants::SETTING_NEW_FILE_DAYS,
            crate::constants::DEFAULT_NEW_FILE_DAYS.to_string()
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_init() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('videos','play_history','app_settings','custom_tags')",
            [],
            |row| row.get(0),
        ).unwrap();
        assert_eq!(count, 4, "All 4 tables should exist");

        assert_eq!(get_schema_version(&conn).unwrap(), 1);

        let days: String = conn.query_row(
            "SELECT value FROM app_settings WHERE key = 'new_file_duration_days'",
            [],
            |row| row.get(0),
        ).unwrap();
        assert_eq!(days, "7");
    }

    #[test]
    fn test_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(dir.path().join("library.db")).unwrap();

        run_migrations(&conn).unwrap();
        conn.execute(
            "UPDATE app_settings SET value = '3' WHERE key = 'new_file_duration_days'",
            [],
        ).unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), 1);
        let days: String = conn.query_row(
            "SELECT value FROM app_settings WHERE key = 'new_file_duration_days'",
            [],
            |row| row.get(0),
        ).unwrap();
        assert_eq!(days, "3", "Re-running migrations must not reseed settings");
    }

    #[test]
    fn test_refuses_newer_schema() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA user_version = 99").unwrap();
        assert!(run_migrations(&conn).is_err());
    }
}
