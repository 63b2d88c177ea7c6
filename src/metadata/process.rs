// Scoped handle around an ffmpeg/ffprobe child process.
//
// The child is always reaped: finish() waits for it, and dropping an
// unfinished handle kills and waits, so no exit path leaks a process.
// stderr is drained on its own thread while stdout is read, so a tool that
// floods stderr can never stall on a full pipe.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;

use crate::error::Result;
use crate::tools::Tool;

/// Longest stderr tail carried into an error message
const STDERR_TAIL_CHARS: usize = 2_000;

pub struct ProbeProcess {
    child: Option<Child>,
    tool: Tool,
}

impl ProbeProcess {
    pub fn spawn(mut cmd: Command, tool: Tool) -> Result<Self> {
        let child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| tool.error(format!("Failed to run {}: {}", tool.name(), e)))?;
        Ok(Self { child: Some(child), tool })
    }

    /// Read stdout to the end and wait for exit. Non-zero exit is an error.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let tool = self.tool;
        let Some(child) = self.child.as_mut() else {
            return Err(tool.error(format!("{} already finished", tool.name())));
        };

        let stderr_reader = child.stderr.take().map(|mut err| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = err.read_to_end(&mut buf);
                buf
            })
        });

        let mut stdout = Vec::new();
        if let Some(mut out) = child.stdout.take() {
            out.read_to_end(&mut stdout)?;
        }

        let status = child.wait()?;
        self.child = None;

        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(tool.error(format!(
                "{} failed ({}): {}",
                tool.name(),
                status,
                stderr_tail(&stderr)
            )));
        }
        Ok(stdout)
    }
}

impl Drop for ProbeProcess {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - STDERR_TAIL_CHARS).collect();
    format!("...{}", tail)
}
