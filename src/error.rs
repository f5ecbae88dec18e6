//! Error types for the plugin bank.
//!
//! Description failures ([`DescribeError`]) abort one plugin only. Mapping
//! failures make one plugin unusable. Neither aborts discovery: the bank logs
//! them and continues with the next plugin.

use modbank_plugin_api::DescribeError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to load a plugin's code and resolve its callbacks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// The shared object could not be opened.
    #[error("cannot open {path}: {reason}")]
    Open {
        /// Library path.
        path: PathBuf,
        /// Loader diagnostic.
        reason: String,
    },

    /// The shared object does not export the entry symbol.
    #[error("{path} does not export {symbol}")]
    MissingEntry {
        /// Library path.
        path: PathBuf,
        /// Entry symbol looked up.
        symbol: &'static str,
    },

    /// A callback named at describe time is absent from the loaded code.
    #[error("unresolved symbol '{symbol}' in {plugin}")]
    UnresolvedSymbol {
        /// Plugin path or name.
        plugin: String,
        /// Symbol name.
        symbol: String,
    },

    /// Describing the loaded code failed.
    #[error("cannot describe {plugin}: {source}")]
    Describe {
        /// Plugin path or name.
        plugin: String,
        /// Underlying description error.
        #[source]
        source: DescribeError,
    },
}

/// Plugin cache I/O failures.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Reading or writing the cache file failed.
    #[error("cache I/O error on {path}: {source}")]
    Io {
        /// Cache file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The cache file is not valid JSON for this format.
    #[error("malformed cache {path}: {source}")]
    Json {
        /// Cache file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The cache was written by an incompatible version.
    #[error("cache {path} has version {found}, expected {expected}")]
    Version {
        /// Cache file.
        path: PathBuf,
        /// Version in the file.
        found: u32,
        /// Version this build writes.
        expected: u32,
    },
}

/// Errors surfaced while building or acquiring the bank.
#[derive(Error, Debug)]
pub enum BankError {
    /// A static plugin failed to describe; static plugins must be valid.
    #[error("static plugin '{name}' is invalid: {source}")]
    StaticPlugin {
        /// Registration label: `core`, or `#` and the static entry index.
        name: String,
        /// Underlying description error.
        #[source]
        source: DescribeError,
    },

    /// A static plugin failed to map.
    #[error(transparent)]
    Map(#[from] MapError),

    /// Settings rejected.
    #[error("invalid settings: {0}")]
    Settings(String),
}

/// Convenience alias for bank results.
pub type BankResult<T> = Result<T, BankError>;
