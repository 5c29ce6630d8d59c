//! Timestamped run log.
//!
//! One line per step plus the captured output of every command. The terminal
//! only shows the progress bar, so this file is where failures get diagnosed.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;

use crate::error::Result;

/// Append-only log file. A disabled log swallows every line.
#[derive(Debug, Clone)]
pub struct StepLog {
    path: Option<PathBuf>,
}

impl StepLog {
    /// Open (creating if needed) the log at `path`, including parent dirs.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self { path: Some(path) })
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one timestamped line.
    pub async fn line(&self, message: &str) -> Result<()> {
        self.write(&format_line(Utc::now(), message)).await
    }

    /// Append captured command output under a tag, one timestamped line per
    /// output line.
    pub async fn block(&self, tag: &str, output: &str) -> Result<()> {
        if self.path.is_none() || output.trim().is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let text: String = output
            .lines()
            .map(|l| format_line(now, &format!("[{}] {}", tag, l)))
            .collect();
        self.write(&text).await
    }

    async fn write(&self, text: &str) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// `[2026-01-02T03:04:05Z] message\n`
pub fn format_line(at: DateTime<Utc>, message: &str) -> String {
    format!("[{}] {}\n", at.format("%Y-%m-%dT%H:%M:%SZ"), message)
}
