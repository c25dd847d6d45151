use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{self, schema::LoggingConfig};

// ---------------------------------------------------------------------------
// Call log entry (JSONL)
// ---------------------------------------------------------------------------

/// How a call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Ok,
    HttpError,
    NetworkFailure,
}

impl std::fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::HttpError => write!(f, "http_error"),
            Self::NetworkFailure => write!(f, "network_failure"),
        }
    }
}

/// A single line of the call log (`~/.crmlens/call-log.jsonl` by default).
///
/// One entry is written per API call, whatever its outcome. Read back by
/// `crmlens history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallLogEntry {
    pub timestamp: String,
    /// Path that was requested (after alias resolution).
    pub endpoint: String,
    pub outcome: CallOutcome,
    /// HTTP status, absent for network failures.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<u16>,
    /// Classified shape name, only for successful calls.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub shape: Option<String>,
    pub latency_ms: u64,
}

impl CallLogEntry {
    /// Entry stamped with the current time.
    pub fn now(
        endpoint: &str,
        outcome: CallOutcome,
        status: Option<u16>,
        shape: Option<&str>,
        latency_ms: u64,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            endpoint: endpoint.to_string(),
            outcome,
            status,
            shape: shape.map(str::to_string),
            latency_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Append an entry to the call log. Failures are swallowed; logging never
/// breaks a call.
pub fn log_call(path: &Path, entry: &CallLogEntry) {
    let _ = append_log_entry(path, entry);
}

// ---------------------------------------------------------------------------
// Reading log entries
// ---------------------------------------------------------------------------

/// Read every entry from the call log.
///
/// Silently skips malformed lines. Returns an empty vec if the file does not
/// exist or cannot be read.
pub fn read_all_entries(path: &Path) -> Vec<CallLogEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<CallLogEntry>(&line).ok())
        .collect()
}

/// The last `limit` entries, oldest first.
pub fn read_recent(path: &Path, limit: usize) -> Vec<CallLogEntry> {
    let mut entries = read_all_entries(path);
    let skip = entries.len().saturating_sub(limit);
    entries.drain(..skip);
    entries
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn append_log_entry(path: &Path, entry: &CallLogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Configured call log path, or `None` when logging is disabled.
pub fn call_log_path(config: &LoggingConfig) -> Option<PathBuf> {
    config.enabled.then(|| config::expand_path(&config.path))
}
