//! Dynamic plugin discovery.
//!
//! Each plugin directory is handled on its own:
//! - with `read_cache`, its cache file is consulted and fresh entries skip
//!   loading entirely
//! - with `scan`, the directory is walked for plugin libraries; without it
//!   only cached plugins are registered
//! - with `write_cache`, a new cache file reflecting the scan is written and
//!   libraries are opened in fast mode and closed right after describing

use super::cache::{cache_path, relative_key, CacheEntry, PluginCache};
use super::describe::{describe, PluginDescription};
use super::loader::{file_stamp, scan_directory, LoadMode};
use super::plugin::{Mapping, PluginOrigin};
use super::symbols::collect_symbols;
use super::Bank;
use std::path::Path;
use std::sync::Arc;

/// Which discovery steps run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryMode {
    /// Consult existing cache files.
    pub read_cache: bool,
    /// Walk plugin directories.
    pub scan: bool,
    /// Rewrite cache files.
    pub write_cache: bool,
}

impl DiscoveryMode {
    /// Mode derived from the three core options. Resetting the cache writes
    /// a fresh one and ignores the existing file.
    pub fn from_options(use_cache: bool, scan: bool, reset_cache: bool) -> Self {
        Self {
            read_cache: use_cache && !reset_cache,
            scan,
            write_cache: reset_cache,
        }
    }
}

impl Bank {
    /// Discover the plugins of every directory in `dirs`.
    ///
    /// Returns the number of dynamic plugins registered. Broken plugins are
    /// logged and skipped.
    pub fn discover(
        &mut self,
        dirs: &[impl AsRef<Path>],
        max_depth: usize,
        cache_file_name: &str,
        mode: DiscoveryMode,
    ) -> usize {
        dirs.iter()
            .map(|dir| self.discover_dir(dir.as_ref(), max_depth, cache_file_name, mode))
            .sum()
    }

    fn discover_dir(
        &mut self,
        dir: &Path,
        max_depth: usize,
        cache_file_name: &str,
        mode: DiscoveryMode,
    ) -> usize {
        let cache_file = cache_path(dir, cache_file_name);
        let mut cache = if mode.read_cache {
            PluginCache::load_or_empty(&cache_file)
        } else {
            PluginCache::new()
        };

        let count = if mode.scan {
            self.scan_dir(dir, max_depth, &mut cache, mode)
        } else {
            self.register_cached(dir, &cache)
        };

        if mode.write_cache {
            match cache.save(&cache_file) {
                Ok(()) => tracing::info!(
                    cache = %cache_file.display(),
                    plugins = cache.len(),
                    "plugin cache written"
                ),
                Err(e) => tracing::warn!(error = %e, "cannot write plugin cache"),
            }
        }
        tracing::info!(dir = %dir.display(), plugins = count, "plugin directory loaded");
        count
    }

    fn scan_dir(
        &mut self,
        dir: &Path,
        max_depth: usize,
        cache: &mut PluginCache,
        mode: DiscoveryMode,
    ) -> usize {
        let mut fresh = PluginCache::new();
        let mut count = 0;
        for path in scan_directory(dir, max_depth) {
            let key = relative_key(dir, &path);
            let (mtime, size) = match file_stamp(&path) {
                Ok(stamp) => stamp,
                Err(e) => {
                    tracing::warn!(plugin = %path.display(), error = %e, "cannot stat plugin");
                    continue;
                }
            };
            let origin = PluginOrigin::Dynamic {
                path: path.clone(),
                mtime,
                size,
            };

            if let Some(hit) = cache.lookup(&key, mtime, size) {
                let description = hit.description.clone();
                self.commit(origin, &description);
                fresh.insert(key, CacheEntry { mtime, size, description });
                count += 1;
                continue;
            }

            let load_mode = if mode.write_cache {
                LoadMode::Fast
            } else {
                LoadMode::Safe
            };
            if let Some(description) = self.load_dynamic(origin, load_mode) {
                fresh.insert(key, CacheEntry { mtime, size, description });
                count += 1;
            }
        }
        *cache = fresh;
        count
    }

    fn register_cached(&mut self, dir: &Path, cache: &PluginCache) -> usize {
        let mut count = 0;
        for (key, entry) in cache.iter() {
            let origin = PluginOrigin::Dynamic {
                path: dir.join(key),
                mtime: entry.mtime,
                size: entry.size,
            };
            self.commit(origin, &entry.description);
            count += 1;
        }
        count
    }

    /// Open, describe and commit one dynamic plugin.
    ///
    /// In safe mode the library stays open as the plugin's mapping; in fast
    /// mode it is closed once described.
    fn load_dynamic(&mut self, origin: PluginOrigin, mode: LoadMode) -> Option<PluginDescription> {
        let PluginOrigin::Dynamic { path, .. } = &origin else {
            return None;
        };
        let path = path.clone();

        let library = match self.opener().open(&path, mode) {
            Ok(library) => library,
            Err(e) => {
                tracing::warn!(plugin = %path.display(), error = %e, "cannot load plugin");
                return None;
            }
        };
        let entry = match library.entry() {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(plugin = %path.display(), error = %e, "not a plugin");
                return None;
            }
        };
        let description = match describe(entry) {
            Ok(description) => description,
            Err(e) => {
                tracing::error!(plugin = %path.display(), error = %e, "cannot describe plugin");
                return None;
            }
        };

        let plugin = self.commit(origin, &description);
        if mode == LoadMode::Safe {
            let mapping = collect_symbols(entry)
                .map_err(|source| crate::error::MapError::Describe {
                    plugin: plugin.label(),
                    source,
                })
                .and_then(|symbols| {
                    Mapping::resolve(
                        &plugin.label(),
                        &plugin.modules,
                        symbols,
                        Some(library),
                        !plugin.unloadable,
                    )
                });
            match mapping {
                Ok(mapping) => {
                    let _ = plugin.mapping.set(Arc::new(mapping));
                }
                Err(e) => tracing::warn!(plugin = %path.display(), error = %e, "cannot map plugin"),
            }
        }
        Some(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_options() {
        let mode = DiscoveryMode::from_options(true, true, false);
        assert!(mode.read_cache && mode.scan && !mode.write_cache);

        let mode = DiscoveryMode::from_options(true, true, true);
        assert!(!mode.read_cache && mode.write_cache);

        let mode = DiscoveryMode::from_options(false, false, false);
        assert!(!mode.read_cache && !mode.scan);
    }
}
