//! Best-effort local cache of a recipient's playback progress.
//!
//! Progress lets a recipient resume a story after a reload. It is advisory:
//! every failure here is reported as a [`ProgressError`] and the playback
//! controller logs it and carries on without resume support.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::types::Answers;

/// Prefix of every progress key; the story id follows.
pub const PROGRESS_KEY_PREFIX: &str = "storyline-progress-";

/// Deterministic cache key for a story.
pub fn progress_key(story_id: &str) -> String {
    format!("{PROGRESS_KEY_PREFIX}{story_id}")
}

/// Snapshot of a recipient's pass through a story.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Number of chapters revealed so far. `chapters + 1` means the final
    /// message has been reached.
    pub revealed_count: usize,
    #[serde(default)]
    pub answers: Answers,
    /// Set once the recipient explicitly saved their answers.
    #[serde(default)]
    pub saved: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("Progress storage is unavailable")]
    Unavailable,

    #[error("Progress I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Progress serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Keyed storage for [`Progress`] records.
pub trait ProgressStore: Send + Sync {
    /// Load the record for `story_id`. Absent and unreadable records both
    /// come back as `Ok(None)`.
    fn load(&self, story_id: &str) -> Result<Option<Progress>, ProgressError>;

    fn save(&self, story_id: &str, progress: &Progress) -> Result<(), ProgressError>;

    fn clear(&self, story_id: &str) -> Result<(), ProgressError>;
}

fn decode(story_id: &str, raw: &str) -> Option<Progress> {
    match serde_json::from_str(raw) {
        Ok(progress) => Some(progress),
        Err(e) => {
            tracing::warn!(story_id, error = %e, "Discarding unreadable progress record");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// One JSON file per story under a directory.
///
/// File names carry the hex-encoded story id, so distinct ids never share a
/// file and no id can name a path outside the directory. Records are written
/// to a temporary sibling and renamed into place, so a crash mid-write leaves
/// the previous record intact.
///
/// Calls are synchronous. The controller persists before it mutates and
/// needs the outcome in-line; each call touches one small file.
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    dir: PathBuf,
}

impl FileProgressStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, story_id: &str) -> PathBuf {
        self.dir
            .join(format!("{PROGRESS_KEY_PREFIX}{}.json", hex::encode(story_id)))
    }
}

impl ProgressStore for FileProgressStore {
    fn load(&self, story_id: &str) -> Result<Option<Progress>, ProgressError> {
        match std::fs::read_to_string(self.path_for(story_id)) {
            Ok(raw) => Ok(decode(story_id, &raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, story_id: &str, progress: &Progress) -> Result<(), ProgressError> {
        std::fs::create_dir_all(&self.dir)?;
        let raw = serde_json::to_string(progress)?;
        let path = self.path_for(story_id);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn clear(&self, story_id: &str) -> Result<(), ProgressError> {
        match std::fs::remove_file(self.path_for(story_id)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-process store holding serialized records, keyed like the file store.
#[derive(Debug)]
pub struct MemoryProgressStore {
    entries: Mutex<HashMap<String, String>>,
    available: bool,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::default(),
            available: true,
        }
    }

    /// A store whose every call fails, like a disabled browser cache.
    pub fn unavailable() -> Self {
        Self {
            entries: Mutex::default(),
            available: false,
        }
    }

    /// Store raw JSON as-is, e.g. to simulate a corrupt record.
    #[cfg(test)]
    fn insert_raw(&self, story_id: &str, raw: impl Into<String>) {
        if let Ok(mut map) = self.entries.lock() {
            map.insert(progress_key(story_id), raw.into());
        }
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, ProgressError> {
        if !self.available {
            return Err(ProgressError::Unavailable);
        }
        self.entries.lock().map_err(|_| ProgressError::Unavailable)
    }
}

impl Default for MemoryProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self, story_id: &str) -> Result<Option<Progress>, ProgressError> {
        let entries = self.entries()?;
        Ok(entries
            .get(&progress_key(story_id))
            .and_then(|raw| decode(story_id, raw)))
    }

    fn save(&self, story_id: &str, progress: &Progress) -> Result<(), ProgressError> {
        let raw = serde_json::to_string(progress)?;
        self.entries()?.insert(progress_key(story_id), raw);
        Ok(())
    }

    fn clear(&self, story_id: &str) -> Result<(), ProgressError> {
        self.entries()?.remove(&progress_key(story_id));
        Ok(())
    }
}

impl<T: ProgressStore + ?Sized> ProgressStore for std::sync::Arc<T> {
    fn load(&self, story_id: &str) -> Result<Option<Progress>, ProgressError> {
        (**self).load(story_id)
    }

    fn save(&self, story_id: &str, progress: &Progress) -> Result<(), ProgressError> {
        (**self).save(story_id, progress)
    }

    fn clear(&self, story_id: &str) -> Result<(), ProgressError> {
        (**self).clear(story_id)
    }
}
