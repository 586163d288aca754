use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

// Threshold-gated operator-facing sink. Explicit value, passed to whatever
// stage needs one; there is no global logger.
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    threshold: u32,
    stream: LogStream,
}

impl Logger {
    pub fn new(threshold: u32, stream: LogStream) -> Self {
        Self { threshold, stream }
    }

    pub fn say(&self, level: u32, message: &str) {
        if level > self.threshold {
            return;
        }
        match self.stream {
            LogStream::Stdout => println!("{message}"),
            LogStream::Stderr => eprintln!("{message}"),
        }
    }
}

// Persistent audit stream, only opened for privileged sessions. One JSON
// object per line.
#[derive(Debug)]
pub struct AuditLog {
    file: File,
}

impl AuditLog {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open audit log: {}", path.display()))?;
        Ok(Self { file })
    }

    pub fn record(&mut self, event: &str, details: serde_json::Value) -> Result<()> {
        let entry = json!({
            "ts": unix_timestamp()?,
            "event": event,
            "details": details,
        });
        writeln!(self.file, "{entry}").context("failed to append audit log")?;
        self.file.flush().context("failed to flush audit log")
    }
}

fn unix_timestamp() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system time is before unix epoch")?
        .as_secs())
}
