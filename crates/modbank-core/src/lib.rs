//! Core types for the modbank plugin bank.
//!
//! This crate holds what both plugins and the host need to agree on without
//! pulling in the loader:
//!
//! - [`capability`]: the closed list of built-in capabilities plus the custom
//!   and invalid forms.
//! - [`config`]: configuration item descriptions and the registry that owns
//!   their live values.
//! - [`callback`]: the type-erased callback carried across the plugin
//!   boundary and the typed signatures recovered from it.
//! - [`error`]: registry errors.

pub mod callback;
pub mod capability;
pub mod config;
pub mod error;

pub use callback::{
    ActivateFn, Callback, DeactivateFn, IntChoicesFn, ProbeInfo, ProbeStatus, StringChoicesFn,
};
pub use capability::{Capability, CapabilityId};
pub use config::{
    ChoiceContext, Choices, ConfigItem, ConfigRegistry, ConfigValue, HintKind, IntKind, ItemClass,
    ItemType, StringKind,
};
pub use error::{ConfigError, ConfigResult};
