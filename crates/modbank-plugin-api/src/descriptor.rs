//! The descriptor callback and the plugin entry point.
//!
//! A plugin exposes exactly one entry point of type [`PluginEntry`]. The host
//! calls it with some implementation of [`Descriptor`] and the plugin issues
//! its [`Action`]s through it. The host runs the same entry point against
//! different descriptors (one records symbol names, one records callback
//! addresses), so an entry point must be a pure function of its actions.

use crate::action::Action;
use thiserror::Error;

/// Major version of the descriptor ABI.
///
/// Bumped whenever an existing [`Action`] id changes meaning.
pub const ABI_VERSION: u32 = 1;

/// Name of the symbol every dynamic plugin exports.
///
/// Composed of a fixed prefix and [`ABI_VERSION`].
pub const ENTRY_SYMBOL: &str = "modbank_entry_v1";

/// Plugin entry point.
pub type PluginEntry = fn(&mut dyn Descriptor) -> Result<(), DescribeError>;

/// Object created by an action, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    /// The action mutated an existing object.
    None,
    /// A new module, by position within the plugin.
    Module(usize),
    /// A new configuration item, by position within the plugin.
    Config(usize),
}

/// Receives the actions issued by a plugin entry point.
pub trait Descriptor {
    /// Apply one action, returning the handle of a newly created object.
    fn apply(&mut self, action: Action) -> Result<Handle, DescribeError>;
}

/// Describe-time validation failures.
///
/// Any of these aborts the description of the whole plugin.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescribeError {
    /// A module property was set before any module was created.
    #[error("module property set before any module was created")]
    NoModule,

    /// A module property was set before the module was named.
    #[error("module #{index}: property set before the module was named")]
    UnnamedModule {
        /// Position of the module in declaration order.
        index: usize,
    },

    /// A module was given an empty name.
    #[error("module name must not be empty")]
    EmptyModuleName,

    /// A numeric capability outside the built-in range.
    #[error("module {module}: invalid capability id {raw}")]
    InvalidCapability {
        /// Module name.
        module: String,
        /// Rejected id.
        raw: u32,
    },

    /// A config property was set before any item was created.
    #[error("config property set before any item was created")]
    NoConfigItem,

    /// A non-hint item is missing its name.
    #[error("configuration item has no name")]
    UnnamedConfig,

    /// An item was given an empty name.
    #[error("configuration item name must not be empty")]
    EmptyConfigName,

    /// A value whose type does not match the item type.
    #[error("option {name}: {what} must be {expected}")]
    WrongValueType {
        /// Option name.
        name: String,
        /// Property being set.
        what: &'static str,
        /// Type class expected.
        expected: &'static str,
    },

    /// A range on an item that is neither integer nor float.
    #[error("option {0}: range requires an integer or float item")]
    RangeNotNumeric(String),

    /// A choice list or callback on an item of the wrong type.
    #[error("option {name}: {what} not allowed on this item type")]
    ChoicesWrongType {
        /// Option name.
        name: String,
        /// Kind of suggestion source.
        what: &'static str,
    },

    /// Suggestions were already set for this item.
    #[error("option {0}: suggestions already set")]
    ChoicesAlreadySet(String),

    /// Value and label lists differ in length.
    #[error("option {0}: values and labels differ in length")]
    ChoicesLengthMismatch(String),

    /// A short option character that cannot be used.
    #[error("option {name}: invalid short option {short:?}")]
    InvalidShort {
        /// Option name.
        name: String,
        /// Rejected character.
        short: char,
    },

    /// A capability on an item that does not select modules.
    #[error("option {0}: capability requires a module-select item")]
    CapabilityNotModule(String),

    /// The descriptor does not understand this action.
    #[error("{target}: unsupported action 0x{action:03x}")]
    Unsupported {
        /// Module or option the action was aimed at.
        target: String,
        /// Action id.
        action: u16,
    },

    /// Failure reported by the plugin itself.
    #[error("{0}")]
    Plugin(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_symbol_carries_version() {
        assert!(ENTRY_SYMBOL.ends_with(&format!("_v{}", ABI_VERSION)));
    }

    #[test]
    fn test_error_messages() {
        let err = DescribeError::InvalidShort {
            name: "verbose".into(),
            short: '?',
        };
        assert_eq!(err.to_string(), "option verbose: invalid short option '?'");
        assert_eq!(
            DescribeError::Unsupported {
                target: "codec".into(),
                action: 0x20d,
            }
            .to_string(),
            "codec: unsupported action 0x20d"
        );
        assert_eq!(
            DescribeError::InvalidCapability {
                module: "mp4".into(),
                raw: 0,
            }
            .to_string(),
            "module mp4: invalid capability id 0"
        );
    }
}
