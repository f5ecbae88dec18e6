//! Typed capability families.
//!
//! A family ties a capability to the argument type its activation callbacks
//! take. Hosts select through a family so that the argument type is fixed at
//! compile time:
//!
//! ```rust,ignore
//! struct Demux;
//! impl CapabilityFamily for Demux {
//!     type Args = DemuxArgs;
//!     fn capability() -> Capability {
//!         CapabilityId::Demux.into()
//!     }
//! }
//! ```

use modbank_core::Capability;

/// A capability together with its activation argument type.
pub trait CapabilityFamily: 'static {
    /// Argument passed to activation and deactivation callbacks.
    type Args: 'static;

    /// Capability served by this family.
    fn capability() -> Capability;
}
