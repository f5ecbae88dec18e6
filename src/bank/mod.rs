//! The plugin bank.
//!
//! A [`Bank`] owns every known plugin, the [`CapabilityIndex`] built from
//! their modules, and the [`ConfigRegistry`] holding their items. Plugins
//! move through these states:
//!
//! ```text
//! described ──map()──► mapped ──bank dropped──► unmapped/destroyed
//! ```
//!
//! Static plugins are mapped when registered and never unloaded. Dynamic
//! plugins are mapped lazily, exactly once: a lock-free check of the plugin's
//! mapping slot, then the bank-wide map lock and a second check.

pub mod cache;
pub mod describe;
mod discovery;
pub mod loader;
pub mod plugin;
pub mod symbols;

pub use cache::{CacheEntry, PluginCache};
pub use describe::{describe, Describer, Module, PluginDescription};
pub use discovery::DiscoveryMode;
pub use loader::{LibraryOpener, LoadMode, NativeOpener, PluginLibrary};
pub use plugin::{Mapping, ModuleCallbacks, ModuleRef, Plugin, PluginOrigin};
pub use symbols::{collect_symbols, SymbolCollector, SymbolTable};

use crate::error::{BankError, BankResult, MapError};
use crate::index::CapabilityIndex;
use modbank_core::{Callback, Capability, ChoiceContext, ConfigItem, ConfigRegistry, ConfigResult};
use modbank_plugin_api::PluginEntry;
use parking_lot::Mutex;
use std::sync::Arc;

/// Counts reported for diagnostics and option table sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BankStats {
    /// Plugins known to the bank.
    pub plugins: usize,
    /// Every module, including invalid-capability carriers.
    pub modules: usize,
    /// Modules listed by capability queries.
    pub listed_modules: usize,
    /// Configuration items that are options; hints are excluded.
    pub config_items: usize,
    /// Boolean configuration items.
    pub bool_items: usize,
}

impl BankStats {
    /// Entries of a long-option table: one per item plus the two negated
    /// aliases of every boolean.
    pub fn option_table_size(&self) -> usize {
        self.config_items + 2 * self.bool_items
    }
}

/// Every plugin known to one runtime, with its index and configuration.
pub struct Bank {
    plugins: Vec<Arc<Plugin>>,
    index: CapabilityIndex,
    config: ConfigRegistry,
    opener: Arc<dyn LibraryOpener>,
    map_lock: Mutex<()>,
}

impl Bank {
    /// Empty bank loading dynamic plugins through `opener`.
    pub fn new(opener: Arc<dyn LibraryOpener>) -> Self {
        Self {
            plugins: Vec::new(),
            index: CapabilityIndex::new(),
            config: ConfigRegistry::new(),
            opener,
            map_lock: Mutex::new(()),
        }
    }

    /// Describe, commit and map a static plugin.
    ///
    /// A description failure is labelled with the position the plugin would
    /// have taken in the bank.
    pub fn register_static(&mut self, entry: PluginEntry) -> BankResult<Arc<Plugin>> {
        let label = format!("#{}", self.plugins.len());
        self.register_static_as(&label, entry)
    }

    /// Like [`Bank::register_static`], labelling a description failure with
    /// `label`.
    pub fn register_static_as(
        &mut self,
        label: &str,
        entry: PluginEntry,
    ) -> BankResult<Arc<Plugin>> {
        let description = describe(entry).map_err(|source| BankError::StaticPlugin {
            name: label.to_string(),
            source,
        })?;
        let plugin = self.commit(PluginOrigin::Static(entry), &description);
        self.map(&plugin)?;
        tracing::debug!(plugin = plugin.name(), modules = plugin.modules.len(), "static plugin registered");
        Ok(plugin)
    }

    /// Add a described plugin: register its items and index its modules.
    ///
    /// The index is left unsorted; call [`Bank::sort`] once every plugin is
    /// committed.
    pub fn commit(&mut self, origin: PluginOrigin, description: &PluginDescription) -> Arc<Plugin> {
        let id = self.plugins.len();
        let config = description
            .config
            .iter()
            .map(|item| {
                let mut item = item.clone();
                item.owner = Some(id);
                self.config.register(item)
            })
            .collect();
        let plugin = Arc::new(Plugin::new(id, origin, description, config));
        for index in 0..plugin.modules.len() {
            self.index.insert(ModuleRef::new(Arc::clone(&plugin), index));
        }
        self.plugins.push(Arc::clone(&plugin));
        plugin
    }

    /// Sort the capability index and the configuration name index.
    pub fn sort(&mut self) {
        self.index.sort_all();
        self.config.sort_index();
    }

    /// Load `plugin`'s code and resolve its callbacks, once.
    pub fn map(&self, plugin: &Plugin) -> Result<Arc<Mapping>, MapError> {
        if let Some(mapping) = plugin.mapping.get() {
            return Ok(Arc::clone(mapping));
        }

        let _guard = self.map_lock.lock();
        if let Some(mapping) = plugin.mapping.get() {
            return Ok(Arc::clone(mapping));
        }

        let mapping = Arc::new(self.load_mapping(plugin)?);
        let mapping = Arc::clone(plugin.mapping.get_or_init(|| mapping));
        tracing::debug!(plugin = %plugin.label(), "plugin mapped");
        Ok(mapping)
    }

    fn load_mapping(&self, plugin: &Plugin) -> Result<Mapping, MapError> {
        let label = plugin.label();
        let describe_err = |source| MapError::Describe {
            plugin: label.clone(),
            source,
        };
        match &plugin.origin {
            PluginOrigin::Static(entry) => {
                let symbols = collect_symbols(*entry).map_err(describe_err)?;
                Mapping::resolve(&label, &plugin.modules, symbols, None, true)
            }
            PluginOrigin::Dynamic { path, .. } => {
                let library = self.opener.open(path, LoadMode::Safe)?;
                let entry = library.entry()?;
                let symbols = collect_symbols(entry).map_err(describe_err)?;
                Mapping::resolve(
                    &label,
                    &plugin.modules,
                    symbols,
                    Some(library),
                    !plugin.unloadable,
                )
            }
        }
    }

    /// Opener used for dynamic plugins.
    pub fn opener(&self) -> &Arc<dyn LibraryOpener> {
        &self.opener
    }

    /// Every plugin, in registration order.
    pub fn plugins(&self) -> &[Arc<Plugin>] {
        &self.plugins
    }

    /// Capability index.
    pub fn index(&self) -> &CapabilityIndex {
        &self.index
    }

    /// Configuration registry.
    pub fn config(&self) -> &ConfigRegistry {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut ConfigRegistry {
        &mut self.config
    }

    /// Candidates for `capability`, highest score first.
    pub fn list(&self, capability: &Capability) -> &[ModuleRef] {
        self.index.list(capability)
    }

    /// Whether any module provides `capability`.
    pub fn has_capability(&self, capability: &Capability) -> bool {
        self.index.has_capability(capability)
    }

    /// Every module except invalid-capability carriers, in plugin order.
    pub fn modules(&self) -> Vec<ModuleRef> {
        self.plugins
            .iter()
            .flat_map(|plugin| {
                (0..plugin.modules.len()).map(move |i| ModuleRef::new(Arc::clone(plugin), i))
            })
            .filter(|module| !module.capability.is_invalid())
            .collect()
    }

    /// Listed module whose canonical name is `name`.
    pub fn find_module(&self, name: &str) -> Option<ModuleRef> {
        self.modules().into_iter().find(|module| module.name() == name)
    }

    /// Whether a listed module is named `name`.
    pub fn module_exists(&self, name: &str) -> bool {
        self.find_module(name).is_some()
    }

    /// Counts for diagnostics.
    pub fn stats(&self) -> BankStats {
        BankStats {
            plugins: self.plugins.len(),
            modules: self.plugins.iter().map(|p| p.modules.len()).sum(),
            listed_modules: self.index.len(),
            config_items: self.plugins.iter().map(|p| p.config_count).sum(),
            bool_items: self.plugins.iter().map(|p| p.bool_count).sum(),
        }
    }

    /// Suggested values of a string item.
    pub fn string_choices(&self, name: &str) -> ConfigResult<Vec<(String, String)>> {
        self.config.string_choices(name, self)
    }

    /// Suggested values of an integer item.
    pub fn int_choices(&self, name: &str) -> ConfigResult<Vec<(i64, String)>> {
        self.config.int_choices(name, self)
    }

    fn owner(&self, item: &ConfigItem) -> Option<&Arc<Plugin>> {
        item.owner.and_then(|id| self.plugins.get(id))
    }
}

impl ChoiceContext for Bank {
    fn modules_for(&self, capability: &str) -> Vec<(String, String)> {
        self.list(&Capability::parse(capability))
            .iter()
            .map(|module| (module.name().to_string(), module.long_name().to_string()))
            .collect()
    }

    fn resolve_choices(&self, item: &ConfigItem, symbol: &str) -> Result<Callback, String> {
        let plugin = self
            .owner(item)
            .ok_or_else(|| "item has no owning plugin".to_string())?;
        let mapping = self.map(plugin).map_err(|e| e.to_string())?;
        mapping
            .symbol(symbol)
            .cloned()
            .ok_or_else(|| format!("symbol '{}' not found", symbol))
    }
}

impl Drop for Bank {
    fn drop(&mut self) {
        self.index.clear();
        self.config.clear_index();
        tracing::debug!(plugins = self.plugins.len(), "plugin bank released");
    }
}

impl std::fmt::Debug for Bank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bank")
            .field("plugins", &self.plugins.len())
            .field("indexed", &self.index.len())
            .field("config", &self.config.len())
            .finish_non_exhaustive()
    }
}
