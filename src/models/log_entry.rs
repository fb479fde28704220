use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const CONTEXT_SEPARATOR: &str = " :: ";

/// Extra detail attached to a log line.
#[derive(Debug, Clone, PartialEq)]
pub enum LogContext {
    Text(String),
    Json(serde_json::Value),
}

impl LogContext {
    /// Plain text is written as-is; anything else as compact JSON. serde_json
    /// never escapes `/`, so URLs stay readable.
    pub fn render(&self) -> String {
        match self {
            LogContext::Text(text) => text.clone(),
            LogContext::Json(value) => value.to_string(),
        }
    }
}

impl From<&str> for LogContext {
    fn from(text: &str) -> Self {
        LogContext::Text(text.to_string())
    }
}

impl From<String> for LogContext {
    fn from(text: String) -> Self {
        LogContext::Text(text)
    }
}

impl From<serde_json::Value> for LogContext {
    fn from(value: serde_json::Value) -> Self {
        LogContext::Json(value)
    }
}

/// One line of the event log: `[YYYY-MM-DD HH:MM:SS] message :: context`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub timestamp: NaiveDateTime,
    pub message: String,
    pub context: Option<String>,
}

impl LogEntry {
    pub fn new(timestamp: NaiveDateTime, message: &str, context: Option<&LogContext>) -> Self {
        Self {
            timestamp,
            message: single_line(message),
            context: context.map(|c| single_line(&c.render())),
        }
    }

    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix('[')?;
        let (stamp, rest) = rest.split_once("] ")?;
        let timestamp = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;

        let (message, context) = match rest.split_once(CONTEXT_SEPARATOR) {
            Some((message, context)) => (message, Some(context.to_string())),
            None => (rest, None),
        };

        Some(Self {
            timestamp,
            message: message.to_string(),
            context,
        })
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format(TIMESTAMP_FORMAT), self.message)?;
        if let Some(context) = &self.context {
            write!(f, "{CONTEXT_SEPARATOR}{context}")?;
        }
        Ok(())
    }
}

/// Line breaks inside a message or context would split the entry, so they
/// are written escaped.
fn single_line(text: &str) -> String {
    text.replace('\r', "\\r").replace('\n', "\\n")
}
