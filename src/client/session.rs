//! Durable storage for the bearer token.
//!
//! One JSON file holds the last token obtained by `crmlens login` (or set by
//! hand). It is read at startup and overwritten on every successful login;
//! the client never deletes it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{self, schema::SessionConfig};

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    token: String,
    saved_at: String,
}

/// File-backed token store.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config::expand_path(&config.path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved token, or `None` if the file is missing, unreadable, or
    /// holds an empty token.
    pub fn load(&self) -> Option<String> {
        let content = fs::read_to_string(&self.path).ok()?;
        let file: SessionFile = serde_json::from_str(&content).ok()?;
        let token = file.token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    /// Replace the saved token.
    pub fn save(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            anyhow::bail!("refusing to save an empty token");
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("failed to create session directory")?;
        }

        let file = SessionFile {
            token: token.to_string(),
            saved_at: Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_string_pretty(&file).context("failed to serialize session")?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write session file {}", self.path.display()))?;
        Ok(())
    }
}
