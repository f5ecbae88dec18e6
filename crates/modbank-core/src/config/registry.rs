//! Config Item Registry
//!
//! The registry owns the live value of every configuration item contributed by
//! every plugin. Item descriptions are immutable and shared; values sit behind
//! one reader/writer lock for the whole registry. Preference edits are rare,
//! so a single coarse lock is all the concurrency this needs.
//!
//! # Locking
//!
//! The convenience getters and setters on [`ConfigRegistry`] take the lock
//! themselves. A caller that needs several reads or writes to be consistent
//! takes the lock once with [`ConfigRegistry::read`] or
//! [`ConfigRegistry::write`] and performs every access through the returned
//! guard.
//!
//! ```rust,ignore
//! let mut cfg = registry.write();
//! let width = cfg.get_int("width")?;
//! cfg.set_int("height", width * 9 / 16)?;
//! ```
//!
//! # Name index
//!
//! Lookups by name go through a sorted index that is rebuilt by
//! [`ConfigRegistry::sort_index`] once all plugins are registered. Items
//! registered after the last rebuild are invisible to lookups until the next.

use super::item::{Choices, ConfigItem, ConfigValue, ItemClass, ItemType};
use crate::callback::Callback;
use crate::error::{ConfigError, ConfigResult};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Label of the "let the selector decide" pseudo-choice.
pub const CHOICE_AUTOMATIC: (&str, &str) = ("any", "Automatic");

/// Label of the "select nothing" pseudo-choice.
pub const CHOICE_DISABLE: (&str, &str) = ("none", "Disable");

/// Services the registry needs from the plugin bank to enumerate choices.
pub trait ChoiceContext {
    /// `(canonical name, long name)` of every listed module of a capability,
    /// highest score first.
    fn modules_for(&self, capability: &str) -> Vec<(String, String)>;

    /// Map the item's owning plugin and resolve a choice callback by symbol.
    fn resolve_choices(&self, item: &ConfigItem, symbol: &str) -> Result<Callback, String>;
}

#[derive(Debug, Clone)]
struct ItemState {
    value: ConfigValue,
    modified: bool,
}

/// Process-wide table of configuration items and their values.
pub struct ConfigRegistry {
    items: Vec<Arc<ConfigItem>>,
    index: Vec<usize>,
    shorts: HashMap<char, usize>,
    values: RwLock<Vec<ItemState>>,
    dirty: AtomicBool,
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            index: Vec::new(),
            shorts: HashMap::new(),
            values: RwLock::new(Vec::new()),
            dirty: AtomicBool::new(false),
        }
    }

    /// Register one item, seeding its value from the default.
    pub fn register(&mut self, item: ConfigItem) -> Arc<ConfigItem> {
        let slot = self.items.len();
        if let Some(short) = item.short {
            match self.shorts.get(&short) {
                Some(&existing) => {
                    tracing::warn!(
                        option = item.name_str(),
                        short = %short,
                        owner = self.items[existing].name_str(),
                        "duplicate short option ignored"
                    );
                }
                None => {
                    self.shorts.insert(short, slot);
                }
            }
        }
        self.values.get_mut().push(ItemState {
            value: item.default.clone(),
            modified: false,
        });
        let item = Arc::new(item);
        self.items.push(Arc::clone(&item));
        item
    }

    /// Rebuild the sorted name index.
    pub fn sort_index(&mut self) {
        let items = &self.items;
        let mut index: Vec<usize> = (0..items.len())
            .filter(|&slot| items[slot].name.is_some())
            .collect();
        index.sort_by(|&a, &b| items[a].name.cmp(&items[b].name));
        for pair in index.windows(2) {
            if items[pair[0]].name == items[pair[1]].name {
                tracing::warn!(
                    option = items[pair[0]].name_str(),
                    "duplicate configuration item name"
                );
            }
        }
        self.index = index;
    }

    /// Drop the name index (done before plugins go away).
    pub fn clear_index(&mut self) {
        self.index.clear();
    }

    fn slot_of(&self, name: &str) -> Option<usize> {
        self.index
            .binary_search_by(|&slot| self.items[slot].name_str().cmp(name))
            .ok()
            .map(|pos| self.index[pos])
    }

    /// Find an item by name.
    pub fn find(&self, name: &str) -> Option<&Arc<ConfigItem>> {
        self.slot_of(name).map(|slot| &self.items[slot])
    }

    /// Find an item by its short option character.
    pub fn find_by_short(&self, short: char) -> Option<&Arc<ConfigItem>> {
        self.shorts.get(&short).map(|&slot| &self.items[slot])
    }

    /// Type of an item, if it exists.
    pub fn get_type(&self, name: &str) -> Option<ItemType> {
        self.find(name).map(|item| item.item_type)
    }

    /// Whether untrusted sources may set this item.
    pub fn is_safe(&self, name: &str) -> bool {
        self.find(name).is_some_and(|item| item.safe)
    }

    /// Indexed items in name order.
    pub fn items(&self) -> impl Iterator<Item = &Arc<ConfigItem>> {
        self.index.iter().map(move |&slot| &self.items[slot])
    }

    /// Number of registered items, hints included.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Clear and return the "values changed since last save" flag.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    /// Whether values changed since the flag was last taken.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    fn lookup(&self, name: &str, expected: ItemClass) -> ConfigResult<usize> {
        let slot = self
            .slot_of(name)
            .ok_or_else(|| ConfigError::NotFound(name.to_string()))?;
        let actual = self.items[slot].class();
        if actual != expected {
            return Err(ConfigError::TypeMismatch {
                name: name.to_string(),
                expected: expected.label(),
                actual: actual.label(),
            });
        }
        Ok(slot)
    }

    /// Take the shared lock for several consistent reads.
    pub fn read(&self) -> ConfigReader<'_> {
        ConfigReader {
            registry: self,
            values: self.values.read(),
        }
    }

    /// Take the exclusive lock for several consistent writes.
    pub fn write(&self) -> ConfigWriter<'_> {
        ConfigWriter {
            registry: self,
            values: self.values.write(),
        }
    }

    /// Current integer value.
    pub fn get_int(&self, name: &str) -> ConfigResult<i64> {
        self.read().get_int(name)
    }

    /// Current float value.
    pub fn get_float(&self, name: &str) -> ConfigResult<f64> {
        self.read().get_float(name)
    }

    /// Current boolean value.
    pub fn get_bool(&self, name: &str) -> ConfigResult<bool> {
        self.read().get_bool(name)
    }

    /// Private copy of the current string value; `None` when empty.
    pub fn get_string(&self, name: &str) -> ConfigResult<Option<String>> {
        self.read().get_string(name)
    }

    /// Set an integer, clamped into the item's range.
    pub fn set_int(&self, name: &str, value: i64) -> ConfigResult<()> {
        self.write().set_int(name, value)
    }

    /// Set a float, clamped into the item's range unless unranged.
    pub fn set_float(&self, name: &str, value: f64) -> ConfigResult<()> {
        self.write().set_float(name, value)
    }

    /// Set a boolean.
    pub fn set_bool(&self, name: &str, value: bool) -> ConfigResult<()> {
        self.write().set_bool(name, value)
    }

    /// Set a string; the empty string stores `None`.
    pub fn set_string(&self, name: &str, value: Option<&str>) -> ConfigResult<()> {
        self.write().set_string(name, value)
    }

    /// Restore an item's default value.
    pub fn reset(&self, name: &str) -> ConfigResult<()> {
        self.write().reset(name)
    }

    /// Restore every item's default value.
    pub fn reset_all(&self) {
        self.write().reset_all();
    }

    /// Whether an item's value differs from its default.
    pub fn is_modified(&self, name: &str) -> ConfigResult<bool> {
        self.read().is_modified(name)
    }

    /// Suggested values of a string item as `(value, label)` pairs.
    ///
    /// Module-select items list every module of their capability between an
    /// "Automatic" and a "Disable" entry. Items without suggestions yield an
    /// empty list.
    pub fn string_choices(
        &self,
        name: &str,
        ctx: &dyn ChoiceContext,
    ) -> ConfigResult<Vec<(String, String)>> {
        let slot = self.lookup(name, ItemClass::String)?;
        let item = &self.items[slot];

        if let (ItemType::String(kind), Some(capability)) = (item.item_type, &item.capability) {
            if kind.is_module() {
                let mut choices = Vec::new();
                choices.push((CHOICE_AUTOMATIC.0.to_string(), CHOICE_AUTOMATIC.1.to_string()));
                choices.extend(ctx.modules_for(capability));
                choices.push((CHOICE_DISABLE.0.to_string(), CHOICE_DISABLE.1.to_string()));
                return Ok(choices);
            }
        }

        match &item.choices {
            Choices::Strings { values, texts } => Ok(values
                .iter()
                .cloned()
                .zip(texts.iter().cloned())
                .collect()),
            Choices::Callback { symbol } => {
                let callback = self.resolve(item, symbol, ctx)?;
                let f = callback
                    .as_string_choices()
                    .ok_or_else(|| signature_mismatch(name, symbol))?;
                Ok(f(name))
            }
            Choices::None | Choices::Integers { .. } => Ok(Vec::new()),
        }
    }

    /// Suggested values of an integer item as `(value, label)` pairs.
    pub fn int_choices(
        &self,
        name: &str,
        ctx: &dyn ChoiceContext,
    ) -> ConfigResult<Vec<(i64, String)>> {
        let slot = self.lookup(name, ItemClass::Integer)?;
        let item = &self.items[slot];
        match &item.choices {
            Choices::Integers { values, texts } => Ok(values
                .iter()
                .copied()
                .zip(texts.iter().cloned())
                .collect()),
            Choices::Callback { symbol } => {
                let callback = self.resolve(item, symbol, ctx)?;
                let f = callback
                    .as_int_choices()
                    .ok_or_else(|| signature_mismatch(name, symbol))?;
                Ok(f(name))
            }
            Choices::None | Choices::Strings { .. } => Ok(Vec::new()),
        }
    }

    fn resolve(
        &self,
        item: &ConfigItem,
        symbol: &str,
        ctx: &dyn ChoiceContext,
    ) -> ConfigResult<Callback> {
        ctx.resolve_choices(item, symbol)
            .map_err(|reason| ConfigError::Mapping {
                name: item.name_str().to_string(),
                reason,
            })
    }
}

fn signature_mismatch(name: &str, symbol: &str) -> ConfigError {
    ConfigError::Mapping {
        name: name.to_string(),
        reason: format!("symbol '{}' has the wrong signature", symbol),
    }
}

impl std::fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigRegistry")
            .field("items", &self.items.len())
            .field("indexed", &self.index.len())
            .finish_non_exhaustive()
    }
}

macro_rules! typed_getters {
    () => {
        /// Current integer value.
        pub fn get_int(&self, name: &str) -> ConfigResult<i64> {
            let slot = self.registry.lookup(name, ItemClass::Integer)?;
            match &self.values[slot].value {
                ConfigValue::Int(v) => Ok(*v),
                other => Err(self.corrupt(name, other)),
            }
        }

        /// Current float value.
        pub fn get_float(&self, name: &str) -> ConfigResult<f64> {
            let slot = self.registry.lookup(name, ItemClass::Float)?;
            match &self.values[slot].value {
                ConfigValue::Float(v) => Ok(*v),
                other => Err(self.corrupt(name, other)),
            }
        }

        /// Current boolean value.
        pub fn get_bool(&self, name: &str) -> ConfigResult<bool> {
            let slot = self.registry.lookup(name, ItemClass::Bool)?;
            match &self.values[slot].value {
                ConfigValue::Bool(v) => Ok(*v),
                other => Err(self.corrupt(name, other)),
            }
        }

        /// Private copy of the current string value; `None` when empty.
        pub fn get_string(&self, name: &str) -> ConfigResult<Option<String>> {
            let slot = self.registry.lookup(name, ItemClass::String)?;
            match &self.values[slot].value {
                ConfigValue::Str(v) => Ok(v.clone()),
                other => Err(self.corrupt(name, other)),
            }
        }

        /// Whether an item's value differs from its default.
        pub fn is_modified(&self, name: &str) -> ConfigResult<bool> {
            let slot = self
                .registry
                .slot_of(name)
                .ok_or_else(|| ConfigError::NotFound(name.to_string()))?;
            Ok(self.values[slot].modified)
        }

        fn corrupt(&self, name: &str, value: &ConfigValue) -> ConfigError {
            ConfigError::TypeMismatch {
                name: name.to_string(),
                expected: self
                    .registry
                    .find(name)
                    .map(|item| item.class().label())
                    .unwrap_or("unknown"),
                actual: value.class().label(),
            }
        }
    };
}

/// Shared-lock view of the registry values.
pub struct ConfigReader<'a> {
    registry: &'a ConfigRegistry,
    values: RwLockReadGuard<'a, Vec<ItemState>>,
}

impl ConfigReader<'_> {
    typed_getters!();
}

/// Exclusive-lock view of the registry values.
pub struct ConfigWriter<'a> {
    registry: &'a ConfigRegistry,
    values: RwLockWriteGuard<'a, Vec<ItemState>>,
}

impl ConfigWriter<'_> {
    typed_getters!();

    fn store(&mut self, slot: usize, value: ConfigValue) {
        let modified = value != self.registry.items[slot].default;
        let state = &mut self.values[slot];
        state.value = value;
        state.modified = modified;
        self.registry.dirty.store(true, Ordering::Release);
    }

    /// Set an integer, clamped into the item's range.
    pub fn set_int(&mut self, name: &str, value: i64) -> ConfigResult<()> {
        let slot = self.registry.lookup(name, ItemClass::Integer)?;
        let value = self.registry.items[slot].clamp_int(value);
        self.store(slot, ConfigValue::Int(value));
        Ok(())
    }

    /// Set a float, clamped into the item's range unless unranged.
    pub fn set_float(&mut self, name: &str, value: f64) -> ConfigResult<()> {
        let slot = self.registry.lookup(name, ItemClass::Float)?;
        let value = self.registry.items[slot].clamp_float(value);
        self.store(slot, ConfigValue::Float(value));
        Ok(())
    }

    /// Set a boolean.
    pub fn set_bool(&mut self, name: &str, value: bool) -> ConfigResult<()> {
        let slot = self.registry.lookup(name, ItemClass::Bool)?;
        self.store(slot, ConfigValue::Bool(value));
        Ok(())
    }

    /// Set a string; the empty string stores `None`.
    pub fn set_string(&mut self, name: &str, value: Option<&str>) -> ConfigResult<()> {
        let slot = self.registry.lookup(name, ItemClass::String)?;
        self.store(slot, ConfigValue::string(value));
        Ok(())
    }

    /// Restore an item's default value.
    pub fn reset(&mut self, name: &str) -> ConfigResult<()> {
        let slot = self
            .registry
            .slot_of(name)
            .ok_or_else(|| ConfigError::NotFound(name.to_string()))?;
        let default = self.registry.items[slot].default.clone();
        self.store(slot, default);
        Ok(())
    }

    /// Restore every item's default value.
    pub fn reset_all(&mut self) {
        for (state, item) in self.values.iter_mut().zip(&self.registry.items) {
            state.value = item.default.clone();
            state.modified = false;
        }
        self.registry.dirty.store(true, Ordering::Release);
    }
}
