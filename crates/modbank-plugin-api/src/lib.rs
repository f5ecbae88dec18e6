//! Plugin-facing API for modbank.
//!
//! A plugin describes its modules and configuration items by issuing a flat
//! sequence of [`Action`]s through a [`Descriptor`]. Only the action ids and
//! the entry point signature are frozen; the host's in-memory layout of
//! modules and items stays private.
//!
//! # Writing a plugin
//!
//! ```rust,ignore
//! use modbank_plugin_api::prelude::*;
//!
//! fn describe(b: &mut PluginBuilder<'_>) -> Result<(), DescribeError> {
//!     b.module("hello")?
//!         .capability_named("greeter", 10)?
//!         .activate::<Greeting>("open_hello", open)?;
//!     Ok(())
//! }
//!
//! declare_plugin!(describe);
//! ```
//!
//! Built into a `cdylib` named `hello_plugin`, the library exports
//! [`ENTRY_SYMBOL`] and is picked up by the host's directory scan.

pub mod action;
pub mod builder;
pub mod descriptor;
pub mod family;

pub use action::{Action, CapabilitySpec};
pub use builder::{BuildResult, PluginBuilder};
pub use descriptor::{DescribeError, Descriptor, Handle, PluginEntry, ABI_VERSION, ENTRY_SYMBOL};
pub use family::CapabilityFamily;

/// Re-export of the core types plugins mention.
pub use modbank_core;

/// Prelude for plugin authors.
pub mod prelude {
    pub use crate::builder::{BuildResult, PluginBuilder};
    pub use crate::declare_plugin;
    pub use crate::descriptor::{DescribeError, Descriptor};
    pub use crate::family::CapabilityFamily;
    pub use modbank_core::{
        Capability, CapabilityId, ProbeInfo, ProbeStatus, StringKind,
    };
}

/// Run a builder-style describe function against a descriptor.
///
/// Static plugins use this to turn a describe function into a
/// [`PluginEntry`]-compatible body.
pub fn describe_with(
    descriptor: &mut dyn Descriptor,
    describe: fn(&mut PluginBuilder<'_>) -> Result<(), DescribeError>,
) -> Result<(), DescribeError> {
    let mut builder = PluginBuilder::new(descriptor);
    describe(&mut builder)
}

/// Export a describe function as the plugin entry point.
///
/// The exported symbol name must equal [`ENTRY_SYMBOL`].
#[macro_export]
macro_rules! declare_plugin {
    ($describe:path) => {
        #[allow(unsafe_code)]
        #[no_mangle]
        pub fn modbank_entry_v1(
            descriptor: &mut dyn $crate::Descriptor,
        ) -> ::std::result::Result<(), $crate::DescribeError> {
            $crate::describe_with(descriptor, $describe)
        }
    };
}
