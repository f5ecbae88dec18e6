//! Type-erased plugin callbacks and the typed signatures behind them.
//!
//! Plugins hand callbacks to the host as [`Callback`] values. The host never
//! calls a `Callback` blindly: it recovers the concrete function pointer with
//! one of the typed accessors, and a mismatch yields `None` rather than a
//! call through the wrong signature.
//!
//! Activation callbacks are generic over the argument type of a capability
//! family. A demux module and a decoder module therefore have different
//! activation signatures, and the selector only invokes a candidate whose
//! callback matches the argument type the caller supplied.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Outcome of probing one candidate module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    /// The module accepted the request.
    Accepted,
    /// Stop immediately and treat the candidate as selected.
    Timeout,
    /// The module declined; try the next candidate.
    Declined,
}

impl ProbeStatus {
    /// Whether the selector stops after this outcome.
    pub fn stops(self) -> bool {
        !matches!(self, ProbeStatus::Declined)
    }
}

/// Context passed to an activation callback.
#[derive(Debug, Clone, Copy)]
pub struct ProbeInfo<'a> {
    /// Canonical name of the module being probed.
    pub module: &'a str,
    /// The module was requested by explicit name under strict selection.
    pub forced: bool,
}

/// Activation entry point for a capability whose arguments are `A`.
pub type ActivateFn<A> = fn(&mut A, &ProbeInfo<'_>) -> ProbeStatus;

/// Deactivation entry point for a capability whose arguments are `A`.
pub type DeactivateFn<A> = fn(&mut A);

/// Enumerates `(value, label)` pairs for a string config item.
pub type StringChoicesFn = fn(item: &str) -> Vec<(String, String)>;

/// Enumerates `(value, label)` pairs for an integer config item.
pub type IntChoicesFn = fn(item: &str) -> Vec<(i64, String)>;

/// A plugin callback with its concrete type erased.
#[derive(Clone)]
pub struct Callback {
    inner: Arc<dyn Any + Send + Sync>,
}

impl Callback {
    fn erase<F: Any + Send + Sync>(f: F) -> Self {
        Self { inner: Arc::new(f) }
    }

    fn recover<F: Any + Copy>(&self) -> Option<F> {
        self.inner.downcast_ref::<F>().copied()
    }

    /// Wrap an activation callback.
    pub fn activate<A: 'static>(f: ActivateFn<A>) -> Self {
        Self::erase(f)
    }

    /// Wrap a deactivation callback.
    pub fn deactivate<A: 'static>(f: DeactivateFn<A>) -> Self {
        Self::erase(f)
    }

    /// Wrap a string choice enumerator.
    pub fn string_choices(f: StringChoicesFn) -> Self {
        Self::erase(f)
    }

    /// Wrap an integer choice enumerator.
    pub fn int_choices(f: IntChoicesFn) -> Self {
        Self::erase(f)
    }

    /// Recover an activation callback taking `A`.
    pub fn as_activate<A: 'static>(&self) -> Option<ActivateFn<A>> {
        self.recover::<ActivateFn<A>>()
    }

    /// Recover a deactivation callback taking `A`.
    pub fn as_deactivate<A: 'static>(&self) -> Option<DeactivateFn<A>> {
        self.recover::<DeactivateFn<A>>()
    }

    /// Recover a string choice enumerator.
    pub fn as_string_choices(&self) -> Option<StringChoicesFn> {
        self.recover::<StringChoicesFn>()
    }

    /// Recover an integer choice enumerator.
    pub fn as_int_choices(&self) -> Option<IntChoicesFn> {
        self.recover::<IntChoicesFn>()
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").finish_non_exhaustive()
    }
}
