//! Plugins, their modules, and the mapped state of their code.

use super::describe::{Module, PluginDescription};
use super::loader::PluginLibrary;
use super::symbols::SymbolTable;
use crate::error::MapError;
use modbank_core::{Callback, ConfigItem};
use modbank_plugin_api::PluginEntry;
use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

/// Where a plugin's code comes from.
#[derive(Clone)]
pub enum PluginOrigin {
    /// Linked into the host; always mapped, never unloaded.
    Static(PluginEntry),
    /// A shared object on disk.
    Dynamic {
        /// Absolute path.
        path: PathBuf,
        /// Modification time, seconds since the epoch.
        mtime: i64,
        /// Size in bytes.
        size: u64,
    },
}

impl fmt::Debug for PluginOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginOrigin::Static(_) => f.write_str("Static"),
            PluginOrigin::Dynamic { path, mtime, size } => f
                .debug_struct("Dynamic")
                .field("path", path)
                .field("mtime", mtime)
                .field("size", size)
                .finish(),
        }
    }
}

/// Resolved callbacks of one module.
#[derive(Debug, Clone, Default)]
pub struct ModuleCallbacks {
    /// Activation callback.
    pub activate: Option<Callback>,
    /// Deactivation callback.
    pub deactivate: Option<Callback>,
}

/// Loaded code of a plugin with its callbacks resolved.
pub struct Mapping {
    symbols: SymbolTable,
    modules: Vec<ModuleCallbacks>,
    library: Option<Box<dyn PluginLibrary>>,
    keep_loaded: bool,
}

impl Mapping {
    /// Resolve every module callback named in `modules` against `symbols`.
    pub(crate) fn resolve(
        plugin: &str,
        modules: &[Module],
        symbols: SymbolTable,
        library: Option<Box<dyn PluginLibrary>>,
        keep_loaded: bool,
    ) -> Result<Self, MapError> {
        let lookup = |symbol: &Option<String>| -> Result<Option<Callback>, MapError> {
            match symbol {
                None => Ok(None),
                Some(name) => symbols.lookup(name).cloned().map(Some).ok_or_else(|| {
                    MapError::UnresolvedSymbol {
                        plugin: plugin.to_string(),
                        symbol: name.clone(),
                    }
                }),
            }
        };
        let modules = modules
            .iter()
            .map(|m| {
                Ok(ModuleCallbacks {
                    activate: lookup(&m.activate)?,
                    deactivate: lookup(&m.deactivate)?,
                })
            })
            .collect::<Result<Vec<_>, MapError>>()?;
        Ok(Self {
            symbols,
            modules,
            library,
            keep_loaded,
        })
    }

    /// Callback registered under `symbol`.
    pub fn symbol(&self, symbol: &str) -> Option<&Callback> {
        self.symbols.lookup(symbol)
    }

    /// Callbacks of the module at `index`.
    pub fn module(&self, index: usize) -> Option<&ModuleCallbacks> {
        self.modules.get(index)
    }

    /// Whether a shared object is held open.
    pub fn is_loaded(&self) -> bool {
        self.library.is_some()
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        if self.keep_loaded {
            if let Some(library) = self.library.take() {
                std::mem::forget(library);
            }
        }
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("symbols", &self.symbols.len())
            .field("loaded", &self.library.is_some())
            .field("keep_loaded", &self.keep_loaded)
            .finish()
    }
}

/// A unit of code contributing modules and configuration items.
#[derive(Debug)]
pub struct Plugin {
    /// Position in the bank's plugin list.
    pub id: usize,
    /// Where the code lives.
    pub origin: PluginOrigin,
    /// Translation domain.
    pub textdomain: Option<String>,
    /// Modules in declaration order.
    pub modules: Vec<Module>,
    /// Configuration items, shared with the registry.
    pub config: Vec<Arc<ConfigItem>>,
    /// Number of option items; hints are not counted.
    pub config_count: usize,
    /// Number of boolean items.
    pub bool_count: usize,
    /// Whether the code may be unloaded at teardown.
    pub unloadable: bool,
    pub(crate) mapping: OnceLock<Arc<Mapping>>,
}

impl Plugin {
    pub(crate) fn new(
        id: usize,
        origin: PluginOrigin,
        description: &PluginDescription,
        config: Vec<Arc<ConfigItem>>,
    ) -> Self {
        Self {
            id,
            origin,
            textdomain: description.textdomain.clone(),
            modules: description.modules.clone(),
            config_count: description.option_count(),
            bool_count: description.bool_count(),
            config,
            unloadable: description.unloadable,
            mapping: OnceLock::new(),
        }
    }

    /// Canonical name of the first module.
    pub fn name(&self) -> &str {
        self.modules.first().map(Module::name).unwrap_or("")
    }

    /// Path of a dynamic plugin.
    pub fn path(&self) -> Option<&std::path::Path> {
        match &self.origin {
            PluginOrigin::Static(_) => None,
            PluginOrigin::Dynamic { path, .. } => Some(path),
        }
    }

    /// Label used in diagnostics: the path, or the name of a static plugin.
    pub fn label(&self) -> String {
        match self.path() {
            Some(path) => path.display().to_string(),
            None => self.name().to_string(),
        }
    }

    /// Whether this plugin is linked into the host.
    pub fn is_static(&self) -> bool {
        matches!(self.origin, PluginOrigin::Static(_))
    }

    /// Current mapping, without attempting to map.
    pub fn mapping(&self) -> Option<&Arc<Mapping>> {
        self.mapping.get()
    }
}

/// Shared reference to one module of a plugin.
#[derive(Clone)]
pub struct ModuleRef {
    plugin: Arc<Plugin>,
    index: usize,
}

impl ModuleRef {
    pub(crate) fn new(plugin: Arc<Plugin>, index: usize) -> Self {
        Self { plugin, index }
    }

    /// Owning plugin.
    pub fn plugin(&self) -> &Arc<Plugin> {
        &self.plugin
    }

    /// Position within the owning plugin.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether both refer to the same module.
    pub fn same_as(&self, other: &ModuleRef) -> bool {
        Arc::ptr_eq(&self.plugin, &other.plugin) && self.index == other.index
    }
}

impl Deref for ModuleRef {
    type Target = Module;

    fn deref(&self) -> &Module {
        &self.plugin.modules[self.index]
    }
}

impl fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRef")
            .field("name", &self.name())
            .field("capability", &self.capability)
            .field("score", &self.score)
            .field("plugin", &self.plugin.id)
            .finish()
    }
}
