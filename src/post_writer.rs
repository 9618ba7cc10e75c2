use crate::error_code::ErrorCode;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// `{YYYY-MM-DD}-{code slug}.md`, e.g. `2024-01-05-ora00001.md`.
pub fn post_filename(date: NaiveDate, code: &ErrorCode) -> String {
    format!("{}-{}.md", date.format("%Y-%m-%d"), code.slug())
}

/// Writes posts into a single output directory.
pub struct PostWriter {
    output_dir: PathBuf,
}

impl PostWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes `content` verbatim and returns the path. An existing file with
    /// the same name is overwritten.
    pub fn write(&self, content: &str, code: &ErrorCode, date: NaiveDate) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("failed to create output directory {}", self.output_dir.display())
        })?;

        let path = self.output_dir.join(post_filename(date, code));
        fs::write(&path, content)
            .with_context(|| format!("failed to write post {}", path.display()))?;

        info!("Wrote post for {} to {}", code, path.display());
        Ok(path)
    }
}
