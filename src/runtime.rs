//! Reference-counted bank lifecycle.
//!
//! A [`RuntimeRegistry`] builds its [`Bank`] on the first
//! [`acquire`](RuntimeRegistry::acquire) and drops it when the last
//! [`BankHandle`] goes away. Discovery runs entirely under the registry
//! lock, so concurrent acquirers either wait for a complete bank or share
//! one that is already published.
//!
//! # Example
//!
//! ```rust,ignore
//! let runtime = RuntimeRegistry::builder()
//!     .settings(BankSettings::default().with_plugin_path("/usr/lib/modbank"))
//!     .build();
//! let bank = runtime.acquire()?;
//! let demux = bank.select(&CapabilityId::Demux.into(), "$demux", false, &mut args);
//! ```

use crate::bank::{Bank, DiscoveryMode, LibraryOpener, NativeOpener};
use crate::core_plugin::{self, OPT_PLUGINS_CACHE, OPT_PLUGINS_SCAN, OPT_RESET_PLUGINS_CACHE};
use crate::error::{BankError, BankResult};
use crate::settings::BankSettings;
use modbank_plugin_api::PluginEntry;
use parking_lot::Mutex;
use std::ops::Deref;
use std::sync::Arc;

#[derive(Default)]
struct State {
    usage: usize,
    bank: Option<Arc<Bank>>,
}

/// Owner of one bank and its usage count.
pub struct RuntimeRegistry {
    statics: Vec<PluginEntry>,
    opener: Arc<dyn LibraryOpener>,
    settings: BankSettings,
    state: Mutex<State>,
}

/// Builder for [`RuntimeRegistry`].
pub struct RuntimeBuilder {
    statics: Vec<PluginEntry>,
    opener: Arc<dyn LibraryOpener>,
    settings: BankSettings,
}

impl RuntimeBuilder {
    /// Register a plugin linked into the host.
    pub fn static_plugin(mut self, entry: PluginEntry) -> Self {
        self.statics.push(entry);
        self
    }

    /// Register several linked plugins.
    pub fn static_plugins(mut self, entries: impl IntoIterator<Item = PluginEntry>) -> Self {
        self.statics.extend(entries);
        self
    }

    /// Replace the dynamic library opener.
    pub fn opener(mut self, opener: Arc<dyn LibraryOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Discovery settings.
    pub fn settings(mut self, settings: BankSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Finish.
    pub fn build(self) -> RuntimeRegistry {
        RuntimeRegistry {
            statics: self.statics,
            opener: self.opener,
            settings: self.settings,
            state: Mutex::new(State::default()),
        }
    }
}

impl RuntimeRegistry {
    /// Builder with the native opener, default settings and no linked
    /// plugins besides the core.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder {
            statics: Vec::new(),
            opener: Arc::new(NativeOpener),
            settings: BankSettings::default(),
        }
    }

    /// Registry with the native opener and the given settings.
    pub fn new(settings: BankSettings) -> Self {
        Self::builder().settings(settings).build()
    }

    /// Settings used for discovery.
    pub fn settings(&self) -> &BankSettings {
        &self.settings
    }

    /// Take a reference to the bank, building it on first use.
    pub fn acquire(&self) -> BankResult<BankHandle<'_>> {
        let mut state = self.state.lock();
        let bank = match &state.bank {
            Some(bank) => Arc::clone(bank),
            None => {
                let bank = Arc::new(self.build_bank()?);
                state.bank = Some(Arc::clone(&bank));
                bank
            }
        };
        state.usage += 1;
        Ok(BankHandle {
            registry: self,
            bank,
        })
    }

    fn release(&self) {
        let released = {
            let mut state = self.state.lock();
            state.usage = state.usage.saturating_sub(1);
            if state.usage == 0 {
                state.bank.take()
            } else {
                None
            }
        };
        if released.is_some() {
            tracing::debug!("last bank reference released");
        }
    }

    /// Outstanding handles.
    pub fn usage(&self) -> usize {
        self.state.lock().usage
    }

    /// Whether a bank is currently built.
    pub fn is_loaded(&self) -> bool {
        self.state.lock().bank.is_some()
    }

    fn build_bank(&self) -> BankResult<Bank> {
        self.settings.validate().map_err(BankError::Settings)?;

        let mut bank = Bank::new(Arc::clone(&self.opener));
        bank.register_static_as("core", core_plugin::entry)?;
        bank.config_mut().sort_index();
        self.apply_overrides(&bank);

        for (i, entry) in self.statics.iter().enumerate() {
            if let Err(e) = bank.register_static_as(&format!("#{}", i), *entry) {
                tracing::error!(error = %e, "static plugin rejected");
            }
        }

        let config = bank.config();
        let option = |name: &str, default: bool| config.get_bool(name).unwrap_or(default);
        let mode = DiscoveryMode::from_options(
            option(OPT_PLUGINS_CACHE, true),
            option(OPT_PLUGINS_SCAN, true),
            option(OPT_RESET_PLUGINS_CACHE, false),
        );
        bank.discover(
            &self.settings.plugin_paths,
            self.settings.max_depth,
            &self.settings.cache_file_name,
            mode,
        );
        bank.sort();

        let stats = bank.stats();
        tracing::info!(
            plugins = stats.plugins,
            modules = stats.modules,
            options = stats.config_items,
            "plugin bank ready"
        );
        Ok(bank)
    }

    fn apply_overrides(&self, bank: &Bank) {
        let overrides = [
            (OPT_PLUGINS_CACHE, self.settings.use_cache),
            (OPT_PLUGINS_SCAN, self.settings.scan),
            (OPT_RESET_PLUGINS_CACHE, self.settings.reset_cache),
        ];
        for (name, value) in overrides {
            if let Some(value) = value {
                if let Err(e) = bank.config().set_bool(name, value) {
                    tracing::warn!(option = name, error = %e, "cannot apply setting");
                }
            }
        }
    }
}

impl std::fmt::Debug for RuntimeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeRegistry")
            .field("statics", &self.statics.len())
            .field("settings", &self.settings)
            .field("usage", &self.usage())
            .finish_non_exhaustive()
    }
}

/// A counted reference to an acquired bank.
pub struct BankHandle<'r> {
    registry: &'r RuntimeRegistry,
    bank: Arc<Bank>,
}

impl Deref for BankHandle<'_> {
    type Target = Bank;

    fn deref(&self) -> &Bank {
        &self.bank
    }
}

impl Clone for BankHandle<'_> {
    fn clone(&self) -> Self {
        self.registry.state.lock().usage += 1;
        Self {
            registry: self.registry,
            bank: Arc::clone(&self.bank),
        }
    }
}

impl Drop for BankHandle<'_> {
    fn drop(&mut self) {
        self.registry.release();
    }
}

impl std::fmt::Debug for BankHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BankHandle").field(&*self.bank).finish()
    }
}
