//! Append-only event log backed by a flat text file.
//!
//! Every webhook, verification and send event lands here as one line in the
//! format rendered by [`LogEntry`]. Writers are serialized behind a mutex so
//! concurrent requests never interleave partial lines, and each appended line
//! is broadcast to live subscribers (the admin log stream).

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;
use tokio::sync::broadcast;

use crate::models::{LogContext, LogEntry};

pub trait LogSink: Send + Sync {
    fn append(&self, message: &str, context: Option<LogContext>);

    /// The last `lines` lines, oldest first.
    fn tail(&self, lines: usize) -> Vec<String>;

    fn clear(&self) -> io::Result<()>;

    fn size_bytes(&self) -> u64;

    fn exists(&self) -> bool;

    fn subscribe(&self) -> broadcast::Receiver<String>;
}

pub struct FileLogSink {
    path: PathBuf,
    write_lock: Mutex<()>,
    tx: broadcast::Sender<String>,
}

impl FileLogSink {
    /// Opens (and on first use creates) the log file, writing a `Log created`
    /// line when the file did not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let (tx, _) = broadcast::channel(256);
        let sink = Self {
            path,
            write_lock: Mutex::new(()),
            tx,
        };

        if !sink.path.exists() {
            sink.write_line(&LogEntry::new(Utc::now().naive_utc(), "Log created", None).to_string())?;
        }

        Ok(sink)
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // One write call per line so the OS append is a single chunk.
        file.write_all(format!("{line}\n").as_bytes())
    }
}

impl LogSink for FileLogSink {
    fn append(&self, message: &str, context: Option<LogContext>) {
        let entry = LogEntry::new(Utc::now().naive_utc(), message, context.as_ref());
        let line = entry.to_string();

        tracing::debug!(target: "event_log", "{line}");

        if let Err(e) = self.write_line(&line) {
            tracing::warn!(error = %e, path = %self.path.display(), "failed to append to event log");
            return;
        }

        // No subscribers is the common case.
        let _ = self.tx.send(line);
    }

    fn tail(&self, lines: usize) -> Vec<String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read event log");
                return Vec::new();
            }
        };

        let all: Vec<&str> = content.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].iter().map(|l| l.to_string()).collect()
    }

    fn clear(&self) -> io::Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn size_bytes(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}
