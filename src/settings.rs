//! Bank settings loaded with figment.
//!
//! Settings are layered:
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. environment variables prefixed with `MODBANK_`
//!
//! # Example
//! ```no_run
//! use modbank::settings::BankSettings;
//!
//! let settings = BankSettings::load_from("modbank.toml")?;
//! settings.validate()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! `MODBANK_MAX_DEPTH=2` overrides `max_depth`, `MODBANK_USE_CACHE=false`
//! disables the plugin cache for one run.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Valid values of [`BankSettings::log_level`].
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Where and how the bank discovers plugins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankSettings {
    /// Directories scanned for dynamic plugins.
    #[serde(default)]
    pub plugin_paths: Vec<PathBuf>,
    /// Maximum recursion depth below each plugin directory.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Override of the `plugins-cache` core option.
    #[serde(default)]
    pub use_cache: Option<bool>,
    /// Override of the `plugins-scan` core option.
    #[serde(default)]
    pub scan: Option<bool>,
    /// Override of the `reset-plugins-cache` core option.
    #[serde(default)]
    pub reset_cache: Option<bool>,
    /// Cache file name inside each plugin directory.
    #[serde(default = "default_cache_file_name")]
    pub cache_file_name: String,
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_depth() -> usize {
    5
}

fn default_cache_file_name() -> String {
    "plugins.cache.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BankSettings {
    fn default() -> Self {
        Self {
            plugin_paths: Vec::new(),
            max_depth: default_max_depth(),
            use_cache: None,
            scan: None,
            reset_cache: None,
            cache_file_name: default_cache_file_name(),
            log_level: default_log_level(),
        }
    }
}

impl BankSettings {
    /// Settings for scanning one directory.
    pub fn with_plugin_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.plugin_paths.push(path.into());
        self
    }

    /// Load defaults overlaid with environment variables only.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    /// Load defaults, then `path` if it exists, then environment variables.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(BankSettings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("MODBANK_"))
            .extract()
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(BankSettings::default()))
            .merge(Env::prefixed("MODBANK_"))
    }

    /// Validate settings after loading.
    pub fn validate(&self) -> Result<(), String> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }
        if self.max_depth == 0 {
            return Err("Invalid max_depth 0. Must be at least 1".to_string());
        }
        if self.cache_file_name.is_empty() {
            return Err("cache_file_name must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let settings = BankSettings::default();
        assert_eq!(settings.max_depth, 5);
        assert_eq!(settings.cache_file_name, "plugins.cache.json");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let settings = BankSettings {
            log_level: "loud".into(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_depth_rejected() {
        let settings = BankSettings {
            max_depth: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "plugin_paths = [\"/opt/plugins\"]\nmax_depth = 2\nuse_cache = false"
        )
        .unwrap();
        let settings = BankSettings::load_from(file.path()).unwrap();
        assert_eq!(settings.plugin_paths, vec![PathBuf::from("/opt/plugins")]);
        assert_eq!(settings.max_depth, 2);
        assert_eq!(settings.use_cache, Some(false));
        assert_eq!(settings.scan, None);
    }

    #[test]
    #[serial]
    fn test_missing_file_falls_back_to_defaults() {
        let settings = BankSettings::load_from("/nonexistent/modbank.toml").unwrap();
        assert_eq!(settings, BankSettings::default());
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_depth = 2\nlog_level = \"debug\"").unwrap();
        std::env::set_var("MODBANK_MAX_DEPTH", "7");
        let settings = BankSettings::load_from(file.path());
        std::env::remove_var("MODBANK_MAX_DEPTH");

        let settings = settings.unwrap();
        assert_eq!(settings.max_depth, 7);
        assert_eq!(settings.log_level, "debug");
    }
}
