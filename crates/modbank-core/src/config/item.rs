//! Configuration item model.
//!
//! A [`ConfigItem`] is the static description of one setting: its type,
//! names, help text, default, range and suggested values. Items are produced
//! while a plugin is described and never change afterwards; the live value is
//! held by the [`ConfigRegistry`](super::ConfigRegistry).

use serde::{Deserialize, Serialize};

/// Kinds of pure hint items (no value, no name required).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    /// Top-level preferences category.
    Category,
    /// Preferences subcategory.
    Subcategory,
    /// Visual section separator.
    Section,
}

/// Integer presentation subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntKind {
    /// Plain integer.
    #[default]
    Plain,
    /// 0xRRGGBB colour.
    Rgb,
    /// 0xAARRGGBB colour.
    Rgba,
}

/// String presentation subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StringKind {
    /// Free text.
    #[default]
    Plain,
    /// Secret; never echoed.
    Password,
    /// Key binding.
    Hotkey,
    /// Name of one module of a capability.
    ModuleSelect,
    /// Comma-separated list of modules of a capability.
    ModuleList,
    /// Path of a file to read.
    FileLoad,
    /// Path of a file to write.
    FileSave,
    /// Directory path.
    Directory,
    /// Font family.
    Font,
    /// Four-character code.
    Fourcc,
}

impl StringKind {
    /// Whether values name modules of a capability.
    pub fn is_module(self) -> bool {
        matches!(self, StringKind::ModuleSelect | StringKind::ModuleList)
    }
}

/// Full item type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// Grouping hint for preference panels and help output.
    Hint(HintKind),
    /// Informational flag without a stored value.
    Flag,
    /// Boolean.
    Bool,
    /// Floating point.
    Float,
    /// Integer.
    Integer(IntKind),
    /// String.
    String(StringKind),
}

/// Coarse type class, which decides the meaningful value variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemClass {
    /// No value.
    Special,
    /// [`ConfigValue::Bool`].
    Bool,
    /// [`ConfigValue::Float`].
    Float,
    /// [`ConfigValue::Int`].
    Integer,
    /// [`ConfigValue::Str`].
    String,
}

impl ItemClass {
    /// Lowercase label used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            ItemClass::Special => "special",
            ItemClass::Bool => "bool",
            ItemClass::Float => "float",
            ItemClass::Integer => "integer",
            ItemClass::String => "string",
        }
    }
}

impl ItemType {
    /// Type class of this item type.
    pub fn class(self) -> ItemClass {
        match self {
            ItemType::Hint(_) | ItemType::Flag => ItemClass::Special,
            ItemType::Bool => ItemClass::Bool,
            ItemType::Float => ItemClass::Float,
            ItemType::Integer(_) => ItemClass::Integer,
            ItemType::String(_) => ItemClass::String,
        }
    }

    /// Whether this is a pure hint, which may stay unnamed.
    pub fn is_hint(self) -> bool {
        matches!(self, ItemType::Hint(_))
    }

    /// Value of a freshly created item of this type.
    pub fn initial_value(self) -> ConfigValue {
        match self.class() {
            ItemClass::Special => ConfigValue::None,
            ItemClass::Bool => ConfigValue::Bool(false),
            ItemClass::Float => ConfigValue::Float(0.0),
            ItemClass::Integer => ConfigValue::Int(0),
            ItemClass::String => ConfigValue::Str(None),
        }
    }
}

/// A configuration value, tagged by type class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfigValue {
    /// Special items carry no value.
    #[default]
    None,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value; the empty string is stored as `None`.
    Str(Option<String>),
}

impl ConfigValue {
    /// Class this value belongs to.
    pub fn class(&self) -> ItemClass {
        match self {
            ConfigValue::None => ItemClass::Special,
            ConfigValue::Bool(_) => ItemClass::Bool,
            ConfigValue::Int(_) => ItemClass::Integer,
            ConfigValue::Float(_) => ItemClass::Float,
            ConfigValue::Str(_) => ItemClass::String,
        }
    }

    /// Build a string value, folding the empty string into `None`.
    pub fn string(value: Option<&str>) -> Self {
        ConfigValue::Str(value.filter(|s| !s.is_empty()).map(str::to_string))
    }
}

/// Suggested values for an item.
///
/// At most one way of listing suggestions exists per item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Choices {
    /// No suggestions.
    #[default]
    None,
    /// Fixed string suggestions with their labels.
    Strings {
        /// Values.
        values: Vec<String>,
        /// Labels, parallel to `values`.
        texts: Vec<String>,
    },
    /// Fixed integer suggestions with their labels.
    Integers {
        /// Values.
        values: Vec<i64>,
        /// Labels, parallel to `values`.
        texts: Vec<String>,
    },
    /// Suggestions computed by a plugin callback, known by symbol name.
    Callback {
        /// Symbol name resolved once the owning plugin is mapped.
        symbol: String,
    },
}

impl Choices {
    /// Whether any way of listing suggestions is set.
    pub fn is_set(&self) -> bool {
        !matches!(self, Choices::None)
    }
}

/// One named, typed setting contributed by a plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigItem {
    /// Type tag.
    pub item_type: ItemType,
    /// Unique name; `None` only for hints.
    pub name: Option<String>,
    /// Short command-line option character.
    #[serde(default)]
    pub short: Option<char>,
    /// One-line description.
    #[serde(default)]
    pub text: Option<String>,
    /// Long description.
    #[serde(default)]
    pub longtext: Option<String>,
    /// Default value.
    pub default: ConfigValue,
    /// Lower bound (integer and float items).
    #[serde(default)]
    pub min: ConfigValue,
    /// Upper bound (integer and float items).
    #[serde(default)]
    pub max: ConfigValue,
    /// Suggested values.
    #[serde(default)]
    pub choices: Choices,
    /// Capability listed by module-select items.
    #[serde(default)]
    pub capability: Option<String>,
    /// Hidden from preferences and help.
    #[serde(default)]
    pub internal: bool,
    /// Never written to the saved configuration.
    #[serde(default)]
    pub unsaveable: bool,
    /// May be set by untrusted sources such as playlist files.
    #[serde(default)]
    pub safe: bool,
    /// Kept only so that old configuration files still parse.
    #[serde(default)]
    pub removed: bool,
    /// Index of the owning plugin in the bank, assigned on commit.
    #[serde(skip)]
    pub owner: Option<usize>,
}

impl ConfigItem {
    /// Fresh item of the given type with type-appropriate defaults.
    pub fn new(item_type: ItemType) -> Self {
        let (min, max) = match item_type.class() {
            ItemClass::Integer => (ConfigValue::Int(i64::MIN), ConfigValue::Int(i64::MAX)),
            ItemClass::Float => (ConfigValue::Float(0.0), ConfigValue::Float(0.0)),
            _ => (ConfigValue::None, ConfigValue::None),
        };
        Self {
            item_type,
            name: None,
            short: None,
            text: None,
            longtext: None,
            default: item_type.initial_value(),
            min,
            max,
            choices: Choices::None,
            capability: None,
            internal: false,
            unsaveable: false,
            safe: false,
            removed: false,
            owner: None,
        }
    }

    /// Type class.
    pub fn class(&self) -> ItemClass {
        self.item_type.class()
    }

    /// Name, or the empty string for hints.
    pub fn name_str(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Clamp an integer into `[min, max]`.
    pub fn clamp_int(&self, value: i64) -> i64 {
        match (&self.min, &self.max) {
            (ConfigValue::Int(min), ConfigValue::Int(max)) if min <= max => {
                value.clamp(*min, *max)
            }
            _ => value,
        }
    }

    /// Clamp a float into `[min, max]`; a `0.0..0.0` range means unranged.
    pub fn clamp_float(&self, value: f64) -> f64 {
        match (&self.min, &self.max) {
            (ConfigValue::Float(min), ConfigValue::Float(max)) => {
                if *min == 0.0 && *max == 0.0 {
                    value
                } else if value < *min {
                    *min
                } else if value > *max {
                    *max
                } else {
                    value
                }
            }
            _ => value,
        }
    }
}
