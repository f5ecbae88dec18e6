//! Module selection.
//!
//! Given a capability and a comma-separated list of shortcuts, the selector
//! walks the capability's candidates in score order and probes each match
//! until one accepts:
//!
//! - `none` ends the selection with no module
//! - `any` tries every remaining candidate with a positive score, then the
//!   walk continues with the next name
//! - other names match shortcuts, ignoring ASCII case
//! - a list starting with `$` names a string option holding the real list
//!
//! Without `strict`, a list whose names all fail falls back to the remaining
//! positive-score candidates. Each candidate is probed at most once per call.

use crate::bank::{Bank, ModuleRef};
use modbank_core::{Callback, Capability, ProbeInfo, ProbeStatus};
use modbank_plugin_api::CapabilityFamily;

/// A module about to be probed.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// The module.
    pub module: &'a ModuleRef,
    /// Its activation callback; `None` means the module accepts outright.
    pub activate: Option<&'a Callback>,
    /// Requested by explicit name under strict selection.
    pub forced: bool,
}

impl Bank {
    /// Select a module, probing candidates through `probe`.
    ///
    /// `probe` is only called for candidates with an activation callback.
    /// A candidate whose plugin cannot be mapped counts as declined.
    pub fn select_with<F>(
        &self,
        capability: &Capability,
        names: &str,
        strict: bool,
        mut probe: F,
    ) -> Option<ModuleRef>
    where
        F: FnMut(&Candidate<'_>) -> ProbeStatus,
    {
        let list = self.list(capability);
        if list.is_empty() {
            tracing::debug!(capability = %capability, "no module provides this capability");
            return None;
        }

        let names = self.expand_names(names);
        let mut remaining: Vec<Option<&ModuleRef>> = list.iter().map(Some).collect();

        for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if name.eq_ignore_ascii_case("none") {
                tracing::debug!(capability = %capability, "selection disabled");
                return None;
            }
            let any = name.eq_ignore_ascii_case("any");
            for slot in remaining.iter_mut() {
                let Some(module) = *slot else { continue };
                let matches = if any {
                    module.score > 0
                } else {
                    module.has_shortcut(name)
                };
                if !matches {
                    continue;
                }
                *slot = None;
                if self.probe(module, strict && !any, &mut probe).stops() {
                    return Some(self.selected(capability, module));
                }
            }
        }

        if !strict {
            for slot in remaining.iter_mut() {
                let Some(module) = slot.take() else { continue };
                if module.score <= 0 {
                    continue;
                }
                if self.probe(module, false, &mut probe).stops() {
                    return Some(self.selected(capability, module));
                }
            }
        }

        tracing::debug!(capability = %capability, names = %names, "no module matched");
        None
    }

    /// Select a module whose activation callbacks take `A`.
    ///
    /// A candidate whose callback takes another argument type is declined.
    pub fn select<A: 'static>(
        &self,
        capability: &Capability,
        names: &str,
        strict: bool,
        args: &mut A,
    ) -> Option<ModuleRef> {
        self.select_with(capability, names, strict, |candidate| {
            let Some(callback) = candidate.activate else {
                return ProbeStatus::Accepted;
            };
            match callback.as_activate::<A>() {
                Some(activate) => {
                    let info = ProbeInfo {
                        module: candidate.module.name(),
                        forced: candidate.forced,
                    };
                    activate(args, &info)
                }
                None => {
                    tracing::warn!(
                        module = candidate.module.name(),
                        "activation callback takes another argument type"
                    );
                    ProbeStatus::Declined
                }
            }
        })
    }

    /// Select a module of capability family `F`.
    pub fn select_family<F: CapabilityFamily>(
        &self,
        names: &str,
        strict: bool,
        args: &mut F::Args,
    ) -> Option<ModuleRef> {
        self.select(&F::capability(), names, strict, args)
    }

    /// Run the deactivation callback of a selected module.
    ///
    /// Returns whether a callback taking `A` was found and called.
    pub fn release<A: 'static>(&self, module: &ModuleRef, args: &mut A) -> bool {
        let mapping = match self.map(module.plugin()) {
            Ok(mapping) => mapping,
            Err(e) => {
                tracing::warn!(module = module.name(), error = %e, "cannot release module");
                return false;
            }
        };
        let deactivate = mapping
            .module(module.index())
            .and_then(|callbacks| callbacks.deactivate.as_ref())
            .and_then(Callback::as_deactivate::<A>);
        match deactivate {
            Some(deactivate) => {
                deactivate(args);
                true
            }
            None => false,
        }
    }

    fn probe<F>(&self, module: &ModuleRef, forced: bool, probe: &mut F) -> ProbeStatus
    where
        F: FnMut(&Candidate<'_>) -> ProbeStatus,
    {
        let mapping = match self.map(module.plugin()) {
            Ok(mapping) => mapping,
            Err(e) => {
                tracing::warn!(module = module.name(), error = %e, "skipping module");
                return ProbeStatus::Declined;
            }
        };
        let activate = mapping
            .module(module.index())
            .and_then(|callbacks| callbacks.activate.as_ref());
        if activate.is_none() {
            return ProbeStatus::Accepted;
        }
        let status = probe(&Candidate {
            module,
            activate,
            forced,
        });
        tracing::trace!(module = module.name(), ?status, "module probed");
        status
    }

    fn selected(&self, capability: &Capability, module: &ModuleRef) -> ModuleRef {
        tracing::debug!(capability = %capability, module = module.name(), "using module");
        module.clone()
    }

    fn expand_names(&self, names: &str) -> String {
        let names = match names.strip_prefix('$') {
            Some(option) => self
                .config()
                .get_string(option)
                .ok()
                .flatten()
                .unwrap_or_default(),
            None => names.to_string(),
        };
        if names.trim().is_empty() {
            "any".to_string()
        } else {
            names
        }
    }
}
