//! Dynamic library loading and plugin directory scanning.
//!
//! The bank reaches shared objects only through [`LibraryOpener`], so tests
//! and embedders can serve entry points without touching the filesystem's
//! dynamic loader. [`NativeOpener`] is the real implementation on top of
//! `libloading`.

#![allow(unsafe_code)]

use crate::error::MapError;
use modbank_plugin_api::{PluginEntry, ENTRY_SYMBOL};
use std::path::{Path, PathBuf};

/// How eagerly symbols are bound when a library is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Lazy binding; for libraries that are described and closed again.
    Fast,
    /// Immediate binding; for libraries whose code will run.
    Safe,
}

/// An open plugin library. Dropping it closes the library.
pub trait PluginLibrary: Send + Sync {
    /// Resolve the entry point.
    fn entry(&self) -> Result<PluginEntry, MapError>;
}

/// Opens plugin libraries by path.
pub trait LibraryOpener: Send + Sync {
    /// Open the library at `path`.
    fn open(&self, path: &Path, mode: LoadMode) -> Result<Box<dyn PluginLibrary>, MapError>;
}

/// Opener backed by the platform dynamic loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeOpener;

struct NativeLibrary {
    library: libloading::Library,
    path: PathBuf,
}

impl PluginLibrary for NativeLibrary {
    fn entry(&self) -> Result<PluginEntry, MapError> {
        // SAFETY: the entry symbol is exported by `declare_plugin!` with the
        // `PluginEntry` signature; the returned fn pointer is only used while
        // the owning `Mapping` keeps this library open.
        let symbol = unsafe { self.library.get::<PluginEntry>(ENTRY_SYMBOL.as_bytes()) };
        symbol.map(|s| *s).map_err(|_| MapError::MissingEntry {
            path: self.path.clone(),
            symbol: ENTRY_SYMBOL,
        })
    }
}

impl LibraryOpener for NativeOpener {
    fn open(&self, path: &Path, mode: LoadMode) -> Result<Box<dyn PluginLibrary>, MapError> {
        let library = open_native(path, mode).map_err(|e| MapError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(NativeLibrary {
            library,
            path: path.to_path_buf(),
        }))
    }
}

#[cfg(unix)]
fn open_native(path: &Path, mode: LoadMode) -> Result<libloading::Library, libloading::Error> {
    use libloading::os::unix::{Library, RTLD_LAZY, RTLD_LOCAL, RTLD_NOW};
    let flags = match mode {
        LoadMode::Fast => RTLD_LAZY | RTLD_LOCAL,
        LoadMode::Safe => RTLD_NOW | RTLD_LOCAL,
    };
    // SAFETY: loading a plugin runs its initialisers; plugin directories are
    // trusted configuration.
    unsafe { Library::open(Some(path), flags) }.map(Into::into)
}

#[cfg(not(unix))]
fn open_native(path: &Path, _mode: LoadMode) -> Result<libloading::Library, libloading::Error> {
    // SAFETY: see the unix variant.
    unsafe { libloading::Library::new(path) }
}

/// File name suffix of plugin libraries on this platform.
pub fn plugin_suffix() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "_plugin.dylib"
    }
    #[cfg(target_os = "windows")]
    {
        "_plugin.dll"
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        "_plugin.so"
    }
}

/// Whether `path` names a plugin library.
pub fn is_plugin_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(plugin_suffix()) && n.len() > plugin_suffix().len())
}

/// Plugin libraries below `root`, at most `max_depth` directories deep,
/// in sorted order.
pub fn scan_directory(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut found = Vec::new();
    scan_into(root, max_depth, &mut found);
    found.sort();
    found
}

fn scan_into(dir: &Path, depth: usize, found: &mut Vec<PathBuf>) {
    if depth == 0 {
        return;
    }
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "cannot read plugin directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            scan_into(&path, depth - 1, found);
        } else if is_plugin_file(&path) {
            found.push(path);
        }
    }
}

/// Modification time (seconds since the epoch) and size of a file.
pub fn file_stamp(path: &Path) -> std::io::Result<(i64, u64)> {
    let meta = std::fs::metadata(path)?;
    let mtime = meta
        .modified()?
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    Ok((mtime, meta.len()))
}
