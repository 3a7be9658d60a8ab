//! Recommendation archive stored as one pretty-printed JSON document.

use crate::domain::error::StockwatchError;
use crate::domain::recommendation::Archive;
use crate::ports::archive_port::ArchiveStore;
use std::fs;
use std::path::{Path, PathBuf};

pub struct JsonArchiveAdapter {
    path: PathBuf,
}

impl JsonArchiveAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn archive_error(&self, reason: impl std::fmt::Display) -> StockwatchError {
        StockwatchError::Archive {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ArchiveStore for JsonArchiveAdapter {
    fn load(&self) -> Result<Archive, StockwatchError> {
        if !self.path.exists() {
            return Ok(Archive::default());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.archive_error(e))?;
        if content.trim().is_empty() {
            return Ok(Archive::default());
        }
        serde_json::from_str(&content).map_err(|e| self.archive_error(e))
    }

    fn save(&self, archive: &Archive) -> Result<(), StockwatchError> {
        let json = serde_json::to_string_pretty(archive).map_err(|e| self.archive_error(e))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.archive_error(e))?;
        }
        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| self.archive_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.archive_error(e))
    }
}
