// Display helpers for video lists

use std::fmt;
use std::str::FromStr;

use chrono::{Local, TimeZone};

use crate::db::schema::VideoRecord;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human readable size, one decimal, base 1024 (e.g. "1.5 MB").
pub fn format_file_size(bytes: i64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, SIZE_UNITS[unit])
}

/// "m:ss" under an hour, "h:mm:ss" otherwise.
pub fn format_duration(ms: i64) -> String {
    let total_seconds = ms.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Local calendar date, e.g. "Nov 14, 2023".
pub fn format_date(ms: i64) -> String {
    format_date_in(ms, &Local)
}

fn format_date_in<Tz: TimeZone>(ms: i64, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    match tz.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.format("%b %d, %Y").to_string(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    /// Last modified on disk
    Date,
    Size,
    Rating,
    Duration,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "date" => Ok(SortKey::Date),
            "size" => Ok(SortKey::Size),
            "rating" => Ok(SortKey::Rating),
            "duration" => Ok(SortKey::Duration),
            other => Err(format!(
                "unknown sort key '{}' (expected name, date, size, rating or duration)",
                other
            )),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::Name => "name",
            SortKey::Date => "date",
            SortKey::Size => "size",
            SortKey::Rating => "rating",
            SortKey::Duration => "duration",
        };
        f.write_str(name)
    }
}

/// Stable sort by `key`; descending is the ascending order reversed.
pub fn sort_videos(videos: &mut [VideoRecord], key: SortKey, ascending: bool) {
    match key {
        SortKey::Name => videos.sort_by(|a, b| a.file_name.cmp(&b.file_name)),
        SortKey::Date => videos.sort_by_key(|v| v.date_modified),
        SortKey::Size => videos.sort_by_key(|v| v.file_size),
        SortKey::Rating => videos.sort_by(|a, b| a.rating.total_cmp(&b.rating)),
        SortKey::Duration => videos.sort_by_key(|v| v.duration_ms),
    }
    if !ascending {
        videos.reverse();
    }
}
