//! Descriptor actions.
//!
//! A plugin describes itself as a flat sequence of actions. Module actions
//! apply to the most recently created module, config actions to the most
//! recently created configuration item.
//!
//! # ABI
//!
//! Each variant carries a stable numeric id (see [`Action::id`]). The
//! enumeration is append-only: new actions take the next free id in their
//! group, and existing ids never move. Renumbering is an ABI break and
//! requires bumping [`crate::ABI_VERSION`].

use modbank_core::{Callback, ConfigValue, ItemType};

/// How a module names its capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilitySpec {
    /// Numeric built-in capability id.
    Id(u32),
    /// Capability name; built-in short names map to the built-in capability.
    Name(String),
}

/// One descriptor action.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Action {
    /// Start a new module.
    CreateModule,
    /// Canonical name (shortcut 0) of the current module.
    ModuleName(String),
    /// Additional shortcuts for the current module.
    ModuleShortcuts(Vec<String>),
    /// Short human-readable name.
    ModuleShortName(String),
    /// Long human-readable name.
    ModuleDescription(String),
    /// Help text.
    ModuleHelp(String),
    /// Capability and score.
    ModuleCapability {
        /// Capability.
        capability: CapabilitySpec,
        /// Priority among modules of the same capability.
        score: i32,
    },
    /// Activation callback and its symbol name.
    ModuleActivate {
        /// Symbol name recorded in descriptions and caches.
        symbol: String,
        /// Callback resolved when the plugin is mapped.
        callback: Callback,
    },
    /// Deactivation callback and its symbol name.
    ModuleDeactivate {
        /// Symbol name recorded in descriptions and caches.
        symbol: String,
        /// Callback resolved when the plugin is mapped.
        callback: Callback,
    },
    /// The plugin's code must never be unloaded.
    NoUnload,
    /// Translation domain of the plugin's strings.
    TextDomain(String),

    /// Start a new configuration item of the given type.
    CreateConfig(ItemType),
    /// Name of the current item.
    ConfigName(String),
    /// Default value of the current item.
    ConfigDefault(ConfigValue),
    /// Range of an integer or float item.
    ConfigRange {
        /// Lower bound.
        min: ConfigValue,
        /// Upper bound.
        max: ConfigValue,
    },
    /// Short option character.
    ConfigShort(char),
    /// Help texts.
    ConfigDescription {
        /// One-line text.
        text: String,
        /// Long text.
        longtext: Option<String>,
    },
    /// Fixed string suggestions.
    ConfigStringList {
        /// Values.
        values: Vec<String>,
        /// Labels.
        texts: Vec<String>,
    },
    /// Fixed integer suggestions.
    ConfigIntList {
        /// Values.
        values: Vec<i64>,
        /// Labels.
        texts: Vec<String>,
    },
    /// Suggestions computed by a callback.
    ConfigListCallback {
        /// Symbol name recorded in descriptions and caches.
        symbol: String,
        /// Callback resolved when the plugin is mapped.
        callback: Callback,
    },
    /// Capability listed by a module-select item.
    ConfigCapability(String),
    /// Value is never saved.
    ConfigVolatile,
    /// Hidden from preferences and help.
    ConfigPrivate,
    /// Obsolete option kept for compatibility.
    ConfigRemoved,
    /// Untrusted sources may set the value.
    ConfigSafe,
}

impl Action {
    /// Stable numeric id of this action.
    pub fn id(&self) -> u16 {
        match self {
            Action::CreateModule => 0x100,
            Action::ModuleName(_) => 0x101,
            Action::ModuleShortcuts(_) => 0x102,
            Action::ModuleShortName(_) => 0x103,
            Action::ModuleDescription(_) => 0x104,
            Action::ModuleHelp(_) => 0x105,
            Action::ModuleCapability { .. } => 0x106,
            Action::ModuleActivate { .. } => 0x107,
            Action::ModuleDeactivate { .. } => 0x108,
            Action::NoUnload => 0x109,
            Action::TextDomain(_) => 0x10a,
            Action::CreateConfig(_) => 0x200,
            Action::ConfigName(_) => 0x201,
            Action::ConfigDefault(_) => 0x202,
            Action::ConfigRange { .. } => 0x203,
            Action::ConfigShort(_) => 0x204,
            Action::ConfigDescription { .. } => 0x205,
            Action::ConfigStringList { .. } => 0x206,
            Action::ConfigIntList { .. } => 0x207,
            Action::ConfigListCallback { .. } => 0x208,
            Action::ConfigCapability(_) => 0x209,
            Action::ConfigVolatile => 0x20a,
            Action::ConfigPrivate => 0x20b,
            Action::ConfigRemoved => 0x20c,
            Action::ConfigSafe => 0x20d,
        }
    }

    /// Whether this action targets the current module.
    pub fn is_module_action(&self) -> bool {
        self.id() & 0xf00 == 0x100
    }

    /// Whether this action targets the current configuration item.
    pub fn is_config_action(&self) -> bool {
        self.id() & 0xf00 == 0x200
    }
}
