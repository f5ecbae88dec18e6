//! Error types for the configuration registry.
//!
//! Out-of-range numeric input is never an error: setters clamp silently.
//! Errors are reserved for caller bugs (unknown names, wrong-typed access) and
//! for failures to map a plugin whose callback enumerates choices.

use thiserror::Error;

/// Convenience alias for config registry results.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Errors returned by [`crate::ConfigRegistry`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No item with this name is registered.
    #[error("unknown configuration item '{0}'")]
    NotFound(String),

    /// The item exists but has a different type class.
    #[error("configuration item '{name}' is {actual}, not {expected}")]
    TypeMismatch {
        /// Item name.
        name: String,
        /// Class the caller asked for.
        expected: &'static str,
        /// Class of the registered item.
        actual: &'static str,
    },

    /// The plugin owning a choice callback could not be mapped.
    #[error("cannot load choices for '{name}': {reason}")]
    Mapping {
        /// Item name.
        name: String,
        /// Loader diagnostic.
        reason: String,
    },
}

impl ConfigError {
    /// Errno-style cause, for callers bridging to C-like status codes.
    pub fn errno(&self) -> i32 {
        match self {
            // EIO
            ConfigError::Mapping { .. } => 5,
            // ENOENT
            ConfigError::NotFound(_) => 2,
            // EINVAL
            ConfigError::TypeMismatch { .. } => 22,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_per_cause() {
        assert_eq!(ConfigError::NotFound("x".into()).errno(), 2);
        let mapping = ConfigError::Mapping {
            name: "x".into(),
            reason: "gone".into(),
        };
        assert_eq!(mapping.errno(), 5);
        let mismatch = ConfigError::TypeMismatch {
            name: "x".into(),
            expected: "bool",
            actual: "int",
        };
        assert_eq!(mismatch.errno(), 22);
    }
}
