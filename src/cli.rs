// Video Explorer CLI binary

use std::path::PathBuf;
use std::sync::Arc;
use clap::{Parser, Subcommand};
use anyhow::{Context, Result};

use video_explorer_lib::config::ExplorerConfig;
use video_explorer_lib::constants::DEFAULT_HISTORY_LIMIT;
use video_explorer_lib::format::{format_date, format_duration, format_file_size, sort_videos, SortKey};
use video_explorer_lib::metadata::{ffprobe, FfmpegProbe};
use video_explorer_lib::reconcile::ReconcileEngine;
use video_explorer_lib::scan::absolute_path;
use video_explorer_lib::scan::discover::{discover_video_folders, DiscoveryOptions};
use video_explorer_lib::settings::{get_new_file_duration_days, set_new_file_duration_days};
use video_explorer_lib::store::VideoStore;
use video_explorer_lib::db::schema::VideoRecord;

#[derive(Parser)]
#[command(name = "vidx")]
#[command(about = "Video Explorer - browse, rate and tag the videos on this device", long_about = None)]
#[command(version)]
struct Cli {
    /// Database file (defaults to ~/.video-explorer/library.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover folders that contain videos
    Folders,

    /// Reconcile one folder with the library
    Scan {
        folder: PathBuf,
    },

    /// List the videos known in a folder
    List {
        folder: PathBuf,
        /// name, date, size, rating or duration
        #[arg(long, default_value = "name")]
        sort: SortKey,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Rate a video (0-5)
    Rate {
        path: String,
        rating: f32,
    },

    /// Replace a video's tags (no tags clears them)
    Tag {
        path: String,
        tags: Vec<String>,
    },

    /// Toggle a video's favorite flag
    Favorite {
        path: String,
    },

    /// Record that a video was played
    Play {
        path: String,
    },

    /// Show recently played videos
    History {
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: i64,
    },

    /// List, add or delete custom tags
    Tags {
        /// Tag to add
        #[arg(long, conflicts_with = "delete")]
        add: Option<String>,
        /// Display color for --add
        #[arg(long, default_value = "#2196F3")]
        color: String,
        /// Tag to delete
        #[arg(long)]
        delete: Option<String>,
    },

    /// Show or change settings
    Settings {
        /// Days a newly found video stays marked as new
        #[arg(long)]
        new_file_days: Option<u32>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = ExplorerConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    match cli.command {
        Commands::Folders => cmd_folders(&config),
        Commands::Scan { folder } => cmd_scan(&config, folder),
        Commands::List { folder, sort, desc, json } => cmd_list(&config, folder, sort, desc, json),
        Commands::Rate { path, rating } => cmd_rate(&config, &path, rating),
        Commands::Tag { path, tags } => cmd_tag(&config, &path, tags),
        Commands::Favorite { path } => cmd_favorite(&config, &path),
        Commands::Play { path } => cmd_play(&config, &path),
        Commands::History { limit } => cmd_history(&config, limit),
        Commands::Tags { add, color, delete } => cmd_tags(&config, add, color, delete),
        Commands::Settings { new_file_days } => cmd_settings(&config, new_file_days),
    }
}

fn open_store(config: &ExplorerConfig) -> Result<VideoStore> {
    VideoStore::open(&config.db_path)
        .with_context(|| format!("Failed to open database at {}", config.db_path.display()))
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn cmd_folders(config: &ExplorerConfig) -> Result<()> {
    let folders = discover_video_folders(&DiscoveryOptions::from_config(config));
    if folders.is_empty() {
        println!("No video folders found.");
        return Ok(());
    }
    for folder in folders {
        println!("{}", folder.display());
    }
    Ok(())
}

fn cmd_scan(config: &ExplorerConfig, folder: PathBuf) -> Result<()> {
    if !ffprobe::is_available() {
        log::warn!("ffprobe not found; durations and thumbnails will be missing");
    }

    let store = Arc::new(open_store(config)?);
    let engine = ReconcileEngine::new(store, Arc::new(FfmpegProbe), config)?;
    let result = engine.reconcile(&folder)?;

    let stats = result.stats;
    println!("Scanned {}", folder.display());
    println!("  Videos:    {}", result.videos.len());
    println!("  New:       {}", stats.inserted);
    println!("  Updated:   {}", stats.updated);
    println!("  Removed:   {}", stats.deleted);
    println!("  Unchanged: {}", stats.unchanged);
    if stats.aged_out > 0 {
        println!("  No longer new: {}", stats.aged_out);
    }
    Ok(())
}

fn cmd_list(config: &ExplorerConfig, folder: PathBuf, sort: SortKey, desc: bool, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let folder = absolute_path(&folder)
        .with_context(|| format!("Cannot resolve {}", folder.display()))?;
    let mut videos = store.get_videos_in_folder(&folder.to_string_lossy())?;
    sort_videos(&mut videos, sort, !desc);

    if json {
        println!("{}", serde_json::to_string_pretty(&videos)?);
        return Ok(());
    }

    if videos.is_empty() {
        println!("No videos known in {} (run `vidx scan` first).", folder.display());
        return Ok(());
    }

    println!("{:<40} {:>10} {:>9} {:>6} {:<13} {}", "NAME", "SIZE", "DURATION", "RATING", "MODIFIED", "FLAGS");
    for video in &videos {
        println!(
            "{:<40} {:>10} {:>9} {:>6.1} {:<13} {}",
            truncate(&video.file_name, 40),
            format_file_size(video.file_size),
            format_duration(video.duration_ms),
            video.rating,
            format_date(video.date_modified),
            flags(video),
        );
    }
    println!("\n{} videos", videos.len());
    Ok(())
}

fn flags(video: &VideoRecord) -> String {
    let mut flags = Vec::new();
    if video.is_new {
        flags.push("new".to_string());
    }
    if video.is_favorite {
        flags.push("fav".to_string());
    }
    if video.play_count > 0 {
        flags.push(format!("played x{}", video.play_count));
    }
    if !video.tags.is_empty() {
        flags.push(format!("[{}]", video.tags.join(", ")));
    }
    flags.join(" ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", head)
}

fn cmd_rate(config: &ExplorerConfig, path: &str, rating: f32) -> Result<()> {
    let store = open_store(config)?;
    store.update_rating(path, rating)?;
    println!("Rated {} {:.1}", path, rating);
    Ok(())
}

fn cmd_tag(config: &ExplorerConfig, path: &str, tags: Vec<String>) -> Result<()> {
    let store = open_store(config)?;
    let tags: Vec<String> = tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    store.update_tags(path, &tags)?;
    if tags.is_empty() {
        println!("Cleared tags on {}", path);
    } else {
        println!("Tagged {}: {}", path, tags.join(", "));
    }
    Ok(())
}

fn cmd_favorite(config: &ExplorerConfig, path: &str) -> Result<()> {
    let store = open_store(config)?;
    if store.toggle_favorite(path)? {
        println!("Added {} to favorites", path);
    } else {
        println!("Removed {} from favorites", path);
    }
    Ok(())
}

fn cmd_play(config: &ExplorerConfig, path: &str) -> Result<()> {
    let store = open_store(config)?;
    store.record_play(path, now_ms())?;
    let plays = store.get_video(path)?.map(|v| v.play_count).unwrap_or(0);
    println!("Played {} ({} plays)", path, plays);
    Ok(())
}

fn cmd_history(config: &ExplorerConfig, limit: i64) -> Result<()> {
    let store = open_store(config)?;
    let history = store.play_history(limit)?;
    if history.is_empty() {
        println!("Nothing played yet.");
        return Ok(());
    }
    for entry in history {
        let name = entry.file_name.as_deref().unwrap_or("(deleted)");
        println!(
            "{}  {:<40} {:>9}  {}",
            format_date(entry.played_at),
            truncate(name, 40),
            format_duration(entry.duration_ms),
            entry.file_path
        );
    }
    Ok(())
}

fn cmd_tags(config: &ExplorerConfig, add: Option<String>, color: String, delete: Option<String>) -> Result<()> {
    let store = open_store(config)?;

    if let Some(name) = add {
        store.add_custom_tag(&name, &color, now_ms())?;
        println!("Added tag '{}' ({})", name.trim(), color);
        return Ok(());
    }

    if let Some(name) = delete {
        if store.delete_custom_tag(&name)? {
            println!("Deleted tag '{}'", name);
        } else {
            anyhow::bail!("No tag named '{}'", name);
        }
        return Ok(());
    }

    let tags = store.list_custom_tags()?;
    if tags.is_empty() {
        println!("No custom tags.");
    }
    for tag in tags {
        println!("{:<24} {}", tag.tag_name, tag.color);
    }
    Ok(())
}

fn cmd_settings(config: &ExplorerConfig, new_file_days: Option<u32>) -> Result<()> {
    let store = open_store(config)?;
    if let Some(days) = new_file_days {
        set_new_file_duration_days(&store, days)?;
    }
    println!("Database:       {}", config.db_path.display());
    println!("New file days:  {}", get_new_file_duration_days(&store));
    println!("Extract workers: {}", config.extract_workers);
    Ok(())
}
