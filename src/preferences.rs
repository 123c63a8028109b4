//! Persisted language preferences
//!
//! The caller owns the store and hands the loaded pair to the session; the
//! orchestrator never reads or writes preferences itself.

use crate::conversation::LanguagePair;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Preference file error: {0}")]
    Io(#[from] io::Error),
    #[error("Preference file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait PreferenceStore: Send + Sync {
    /// The saved pair, or `None` when nothing has been saved yet
    fn load(&self) -> Result<Option<LanguagePair>, PreferenceError>;
    fn save(&self, languages: &LanguagePair) -> Result<(), PreferenceError>;
    fn clear(&self) -> Result<(), PreferenceError>;
}

/// Stores the language pair as a small JSON document
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Result<Option<LanguagePair>, PreferenceError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&self, languages: &LanguagePair) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(languages)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), "Saved language preferences");
        Ok(())
    }

    fn clear(&self) -> Result<(), PreferenceError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryPreferenceStore {
    languages: Mutex<Option<LanguagePair>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(languages: LanguagePair) -> Self {
        Self {
            languages: Mutex::new(Some(languages)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<LanguagePair>> {
        self.languages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Option<LanguagePair>, PreferenceError> {
        Ok(self.slot().clone())
    }

    fn save(&self, languages: &LanguagePair) -> Result<(), PreferenceError> {
        *self.slot() = Some(languages.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), PreferenceError> {
        *self.slot() = None;
        Ok(())
    }
}
