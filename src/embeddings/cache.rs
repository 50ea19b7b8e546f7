//! Disk-persistent prompt embedding cache
//!
//! Entries are keyed by the first 16 hex characters of the SHA-256 of the
//! exact text that was embedded. Each entry remembers the model version that
//! produced it; reads only return entries written by the cache's current
//! model version. Stale rows stay on disk until overwritten or cleared.
//!
//! On disk:
//!
//! ```json
//! { "version": "1.0", "modelVersion": "hash-v1-384",
//!   "entries": { "3f1c...": { "embedding": [..], "modelVersion": "..", "createdAt": ".." } } }
//! ```

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{MineError, Result};

pub const CACHE_FORMAT_VERSION: &str = "1.0";
pub const CACHE_FILE_NAME: &str = "prompt-embeddings.json";

const KEY_HEX_CHARS: usize = 16;

/// `<user cache dir>/skillmine/prompt-embeddings.json`.
pub fn default_cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("skillmine").join(CACHE_FILE_NAME))
}

/// Cache key for `text`: 16-hex prefix of its SHA-256.
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut key = hex::encode(digest);
    key.truncate(KEY_HEX_CHARS);
    key
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptCacheEntry {
    pub embedding: Vec<f32>,
    pub model_version: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheFile {
    version: String,
    model_version: String,
    entries: HashMap<String, PromptCacheEntry>,
}

/// Persistence progress of the in-memory state.
///
/// `Clean` means unchanged since load. A save moves `Dirty -> WritingTemp ->
/// Renamed`, and `Renamed` holds until the next write. A failure while writing
/// the temporary file or renaming it returns to `Dirty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistState {
    Clean,
    Dirty,
    WritingTemp,
    Renamed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub path: PathBuf,
    pub model_version: String,
    pub total_entries: usize,
    pub valid_entries: usize,
    pub stale_entries: usize,
    pub dirty: bool,
}

#[derive(Debug)]
pub struct PromptEmbeddingCache {
    path: PathBuf,
    model_version: String,
    entries: HashMap<String, PromptCacheEntry>,
    state: PersistState,
    persistent: bool,
}

impl PromptEmbeddingCache {
    /// Empty cache that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>, model_version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            model_version: model_version.into(),
            entries: HashMap::new(),
            state: PersistState::Clean,
            persistent: true,
        }
    }

    /// Cache that never touches disk; `save` does nothing.
    pub fn in_memory(model_version: impl Into<String>) -> Self {
        Self {
            persistent: false,
            ..Self::new(PathBuf::new(), model_version)
        }
    }

    /// Load the cache at `path`.
    ///
    /// Never fails: a missing file, unreadable content or an unexpected
    /// structure all produce an empty cache.
    pub fn load(path: impl Into<PathBuf>, model_version: impl Into<String>) -> Self {
        let mut cache = Self::new(path, model_version);

        let raw = match std::fs::read_to_string(&cache.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %cache.path.display(), "no embedding cache yet");
                return cache;
            }
            Err(err) => {
                warn!(path = %cache.path.display(), "cannot read embedding cache: {err}");
                return cache;
            }
        };

        match serde_json::from_str::<CacheFile>(&raw) {
            Ok(file) => {
                if file.version != CACHE_FORMAT_VERSION {
                    debug!(found = %file.version, "embedding cache format differs");
                }
                cache.entries = file.entries;
                debug!(
                    path = %cache.path.display(),
                    entries = cache.entries.len(),
                    stale = cache.stale_count(),
                    "loaded embedding cache"
                );
            }
            Err(err) => {
                warn!(path = %cache.path.display(), "ignoring corrupt embedding cache: {err}");
            }
        }
        cache
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub const fn state(&self) -> PersistState {
        self.state
    }

    pub const fn is_dirty(&self) -> bool {
        matches!(self.state, PersistState::Dirty | PersistState::WritingTemp)
    }

    /// Embedding for `text`, if cached under the current model version.
    pub fn get(&self, text: &str) -> Option<&[f32]> {
        self.entries
            .get(&content_hash(text))
            .filter(|entry| entry.model_version == self.model_version)
            .map(|entry| entry.embedding.as_slice())
    }

    pub fn has(&self, text: &str) -> bool {
        self.get(text).is_some()
    }

    pub fn set(&mut self, text: &str, embedding: Vec<f32>) {
        self.insert(text, embedding, Utc::now());
        self.state = PersistState::Dirty;
    }

    /// Insert many entries with one timestamp.
    pub fn set_batch<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: AsRef<str>,
    {
        let now = Utc::now();
        let mut inserted = 0usize;
        for (text, embedding) in items {
            self.insert(text.as_ref(), embedding, now);
            inserted += 1;
        }
        if inserted > 0 {
            self.state = PersistState::Dirty;
        }
    }

    /// Lookup for every text, in order.
    pub fn get_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Option<Vec<f32>>> {
        texts
            .iter()
            .map(|text| self.get(text.as_ref()).map(<[f32]>::to_vec))
            .collect()
    }

    fn insert(&mut self, text: &str, embedding: Vec<f32>, created_at: DateTime<Utc>) {
        self.entries.insert(
            content_hash(text),
            PromptCacheEntry {
                embedding,
                model_version: self.model_version.clone(),
                created_at,
            },
        );
    }

    /// Entries on disk or in memory, including stale ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries written by a different model version.
    pub fn stale_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.model_version != self.model_version)
            .count()
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.state = PersistState::Dirty;
        }
    }

    pub fn stats(&self) -> CacheStats {
        let stale = self.stale_count();
        CacheStats {
            path: self.path.clone(),
            model_version: self.model_version.clone(),
            total_entries: self.entries.len(),
            valid_entries: self.entries.len() - stale,
            stale_entries: stale,
            dirty: self.is_dirty(),
        }
    }

    /// Persist if dirty: write a sibling temporary file, then rename it over
    /// the cache path.
    ///
    /// # Errors
    ///
    /// Returns [`MineError::CacheWrite`] if any step fails; the previous
    /// file is left as it was and the cache stays dirty.
    pub fn save(&mut self) -> Result<()> {
        if !self.persistent || !self.is_dirty() {
            return Ok(());
        }

        self.state = PersistState::WritingTemp;
        match self.write_and_rename() {
            Ok(()) => {
                self.state = PersistState::Renamed;
                info!(path = %self.path.display(), entries = self.entries.len(), "saved embedding cache");
                Ok(())
            }
            Err(err) => {
                self.state = PersistState::Dirty;
                Err(err)
            }
        }
    }

    fn write_and_rename(&self) -> Result<()> {
        let write_err =
            |err: std::io::Error| MineError::CacheWrite(format!("{}: {err}", self.path.display()));

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(write_err)?;

        let file = CacheFile {
            version: CACHE_FORMAT_VERSION.to_string(),
            model_version: self.model_version.clone(),
            entries: self.entries.clone(),
        };
        let json = serde_json::to_vec(&file)?;

        let mut temp = NamedTempFile::new_in(&parent).map_err(write_err)?;
        temp.write_all(&json).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&self.path)
            .map_err(|err| write_err(err.error))?;
        Ok(())
    }
}
