//! # modbank
//!
//! A plugin module bank: it discovers plugins, records the modules and
//! configuration items they describe, and picks the best module for a
//! capability at run time.
//!
//! ## Crate Structure
//!
//! - **`bank`**: the [`Bank`] itself, plugin descriptions, the on-disk cache,
//!   dynamic library loading and lazy symbol mapping.
//! - **`index`**: capability to candidate modules, sorted by score.
//! - **`selector`**: module selection by capability and name list, with
//!   probe callbacks.
//! - **`runtime`**: reference-counted bank lifecycle shared by the users of
//!   one host.
//! - **`core_plugin`**: the built-in plugin carrying the host's options.
//! - **`settings`**: figment-layered discovery settings.
//! - **`logging`**: tracing subscriber setup.
//! - **`error`**: mapping, cache and bank errors.
//!
//! Plugins are written against [`modbank_plugin_api`]; shared types live in
//! [`modbank_core`]. Both are re-exported.

pub mod bank;
pub mod core_plugin;
pub mod error;
pub mod index;
pub mod logging;
pub mod runtime;
pub mod selector;
pub mod settings;

pub use bank::{Bank, BankStats, ModuleRef, Plugin};
pub use error::{BankError, BankResult, CacheError, MapError};
pub use index::CapabilityIndex;
pub use runtime::{BankHandle, RuntimeBuilder, RuntimeRegistry};
pub use selector::Candidate;
pub use settings::BankSettings;

pub use modbank_core;
pub use modbank_core::{Capability, CapabilityId, ProbeInfo, ProbeStatus};
pub use modbank_plugin_api;
