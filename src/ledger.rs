//! Persistent list of error codes that already have a post.
//!
//! The ledger is a flat JSON array of strings. It is read once per run and
//! rewritten after a post was written successfully. There is no locking: two
//! runs started at the same time can lose one of the appended codes.

use crate::error::PostError;
use crate::error_code::ErrorCode;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct UsedCodeLedger {
    path: PathBuf,
    codes: Vec<ErrorCode>,
}

impl UsedCodeLedger {
    /// Loads the ledger at `path`, or an empty one if the file does not exist.
    ///
    /// Repeated codes keep their first position; later copies are dropped so
    /// the next save writes each code once.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let codes = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read ledger {}", path.display()))?;
            let codes = serde_json::from_str::<Vec<ErrorCode>>(&content)
                .with_context(|| format!("failed to parse ledger {}", path.display()))?;
            dedup_codes(codes, &path)
        } else {
            debug!("No ledger at {}, starting empty", path.display());
            Vec::new()
        };

        let ledger = Self { path, codes };
        info!("Loaded ledger {} with {} codes", ledger.path.display(), ledger.codes.len());
        Ok(ledger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn codes(&self) -> &[ErrorCode] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn contains(&self, code: &ErrorCode) -> bool {
        self.codes.contains(code)
    }

    /// The last `n` codes, oldest first.
    pub fn recent(&self, n: usize) -> &[ErrorCode] {
        let start = self.codes.len().saturating_sub(n);
        &self.codes[start..]
    }

    pub fn append(&mut self, code: ErrorCode) -> Result<()> {
        if self.contains(&code) {
            return Err(PostError::DuplicateCode(code).into());
        }
        self.codes.push(code);
        Ok(())
    }

    /// Overwrites the ledger file with the current codes.
    ///
    /// The JSON goes to a sibling `.tmp` file first and is then renamed over
    /// the ledger.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(&self.codes)?;
        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, content)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("failed to replace ledger {}", self.path.display()))?;

        info!("Saved ledger {} with {} codes", self.path.display(), self.codes.len());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn dedup_codes(codes: Vec<ErrorCode>, path: &Path) -> Vec<ErrorCode> {
    let mut seen = HashSet::with_capacity(codes.len());
    let mut unique = Vec::with_capacity(codes.len());
    for code in codes {
        if seen.insert(code.clone()) {
            unique.push(code);
        } else {
            warn!("Dropping repeated code {} from ledger {}", code, path.display());
        }
    }
    unique
}
