// FFprobe wrapper for duration extraction

use std::path::Path;
use std::process::Command;
use serde::Deserialize;
use crate::error::{VideoExplorerError, Result};
use crate::tools::Tool;
use super::process::ProbeProcess;

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    streams: Option<Vec<FFprobeStream>>,
    format: Option<FFprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FFprobeStream {
    codec_type: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FFprobeFormat {
    duration: Option<String>,
}

/// Run ffprobe on a file and return its duration in milliseconds
pub fn probe_duration_ms(path: &Path) -> Result<i64> {
    let mut cmd = Command::new(Tool::Ffprobe.path());
    cmd.args([
        "-v", "error",
        "-print_format", "json",
        "-show_format",
        "-show_streams",
    ])
    .arg(path);

    let stdout = ProbeProcess::spawn(cmd, Tool::Ffprobe)?.finish()?;
    parse_duration_ms_from_json(&stdout)
}

fn parse_duration_ms_from_json(json: &[u8]) -> Result<i64> {
    let probe_output: FFprobeOutput = serde_json::from_slice(json)
        .map_err(|e| VideoExplorerError::FFprobe(format!("Failed to parse ffprobe output: {}", e)))?;

    duration_from_output(&probe_output)
        .ok_or_else(|| VideoExplorerError::FFprobe("No duration reported".to_string()))
}

/// Container duration first, then the video stream, then any stream.
fn duration_from_output(output: &FFprobeOutput) -> Option<i64> {
    if let Some(d) = output.format.as_ref().and_then(|f| parse_duration_ms(f.duration.as_deref())) {
        return Some(d);
    }

    let streams = output.streams.as_ref()?;
    streams
        .iter()
        .filter(|s| s.codec_type.as_deref() == Some("video"))
        .chain(streams.iter())
        .find_map(|s| parse_duration_ms(s.duration.as_deref()))
}

/// Parse duration string (seconds) to milliseconds
fn parse_duration_ms(duration_str: Option<&str>) -> Option<i64> {
    let seconds: f64 = duration_str?.trim().parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some((seconds * 1000.0).round() as i64)
}

/// Check if ffprobe is available
pub fn is_available() -> bool {
    Tool::Ffprobe.is_available()
}
