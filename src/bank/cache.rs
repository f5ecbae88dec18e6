//! On-disk plugin cache.
//!
//! One JSON file per scanned directory maps each plugin's relative path to
//! its description plus the modification time and size it was taken from.
//! A hit skips loading the shared object entirely; a stamp mismatch makes the
//! entry stale and the plugin is described again.

use super::describe::PluginDescription;
use crate::error::CacheError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Format version written by this build.
pub const CACHE_VERSION: u32 = 1;

/// One cached plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Modification time, seconds since the epoch.
    pub mtime: i64,
    /// Size in bytes.
    pub size: u64,
    /// Cached description.
    pub description: PluginDescription,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    plugins: BTreeMap<String, CacheEntry>,
}

/// Cache of one plugin directory.
#[derive(Debug, Clone, Default)]
pub struct PluginCache {
    entries: BTreeMap<String, CacheEntry>,
}

impl PluginCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a cache file.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let text = std::fs::read_to_string(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CacheFile =
            serde_json::from_str(&text).map_err(|source| CacheError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        if file.version != CACHE_VERSION {
            return Err(CacheError::Version {
                path: path.to_path_buf(),
                found: file.version,
                expected: CACHE_VERSION,
            });
        }
        Ok(Self {
            entries: file.plugins,
        })
    }

    /// Read a cache file, treating every failure as an empty cache.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(cache) => cache,
            Err(CacheError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Self::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring plugin cache");
                Self::new()
            }
        }
    }

    /// Write the cache file, replacing any previous one.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let file = CacheFile {
            version: CACHE_VERSION,
            plugins: self.entries.clone(),
        };
        let text = serde_json::to_string_pretty(&file).map_err(|source| CacheError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, text)
            .and_then(|()| std::fs::rename(&tmp, path))
            .map_err(|source| CacheError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Entry for `relative` if its stamp still matches.
    ///
    /// A stale entry is removed so that it is not written back.
    pub fn lookup(&mut self, relative: &str, mtime: i64, size: u64) -> Option<&CacheEntry> {
        let fresh = match self.entries.get(relative) {
            None => return None,
            Some(entry) => entry.mtime == mtime && entry.size == size,
        };
        if !fresh {
            tracing::debug!(plugin = relative, "stale cache entry");
            self.entries.remove(relative);
            return None;
        }
        self.entries.get(relative)
    }

    /// Record a description.
    pub fn insert(&mut self, relative: String, entry: CacheEntry) {
        self.entries.insert(relative, entry);
    }

    /// Entries by relative path.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CacheEntry)> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cache file path for a plugin directory.
pub fn cache_path(dir: &Path, file_name: &str) -> PathBuf {
    dir.join(file_name)
}

/// Path of `path` relative to `root`, with `/` separators.
pub fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
