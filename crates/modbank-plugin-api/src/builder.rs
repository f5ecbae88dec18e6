//! Chainable helper for writing plugin entry points.
//!
//! ```rust,ignore
//! fn describe(b: &mut PluginBuilder<'_>) -> Result<(), DescribeError> {
//!     b.module("mp4")?
//!         .shortcuts(&["iso"])?
//!         .description("MP4 stream demuxer")?
//!         .capability(CapabilityId::Demux, 240)?
//!         .callbacks::<DemuxArgs>("open_mp4", open, "close_mp4", close)?;
//!     b.add_bool("mp4-m4a-audioonly", false, "M4A audio only", None)?;
//!     Ok(())
//! }
//! ```

use crate::action::{Action, CapabilitySpec};
use crate::descriptor::{DescribeError, Descriptor, Handle};
use modbank_core::{
    ActivateFn, Callback, CapabilityId, ConfigValue, DeactivateFn, HintKind, IntChoicesFn, IntKind,
    ItemType, StringChoicesFn, StringKind,
};

/// Result type of every builder step.
pub type BuildResult<'s, 'd> = Result<&'s mut PluginBuilder<'d>, DescribeError>;

/// Issues [`Action`]s on behalf of a plugin entry point.
pub struct PluginBuilder<'d> {
    descriptor: &'d mut dyn Descriptor,
}

impl<'d> PluginBuilder<'d> {
    /// Wrap a descriptor.
    pub fn new(descriptor: &'d mut dyn Descriptor) -> Self {
        Self { descriptor }
    }

    /// Send a raw action.
    pub fn apply(&mut self, action: Action) -> Result<Handle, DescribeError> {
        self.descriptor.apply(action)
    }

    fn send(&mut self, action: Action) -> BuildResult<'_, 'd> {
        self.descriptor.apply(action)?;
        Ok(self)
    }

    fn send_all(&mut self, actions: Vec<Action>) -> BuildResult<'_, 'd> {
        for action in actions {
            self.descriptor.apply(action)?;
        }
        Ok(self)
    }

    // --- modules ---

    /// Create a module and give it its canonical name.
    pub fn module(&mut self, name: &str) -> BuildResult<'_, 'd> {
        self.send_all(vec![Action::CreateModule, Action::ModuleName(name.to_string())])
    }

    /// Add shortcuts after the canonical name.
    pub fn shortcuts(&mut self, names: &[&str]) -> BuildResult<'_, 'd> {
        self.send(Action::ModuleShortcuts(
            names.iter().map(|s| s.to_string()).collect(),
        ))
    }

    /// Short human-readable name.
    pub fn shortname(&mut self, text: &str) -> BuildResult<'_, 'd> {
        self.send(Action::ModuleShortName(text.to_string()))
    }

    /// Long human-readable name.
    pub fn description(&mut self, text: &str) -> BuildResult<'_, 'd> {
        self.send(Action::ModuleDescription(text.to_string()))
    }

    /// Help text.
    pub fn help(&mut self, text: &str) -> BuildResult<'_, 'd> {
        self.send(Action::ModuleHelp(text.to_string()))
    }

    /// Built-in capability and score.
    pub fn capability(&mut self, id: CapabilityId, score: i32) -> BuildResult<'_, 'd> {
        self.send(Action::ModuleCapability {
            capability: CapabilitySpec::Id(id.raw()),
            score,
        })
    }

    /// Capability by name and score.
    pub fn capability_named(&mut self, name: &str, score: i32) -> BuildResult<'_, 'd> {
        self.send(Action::ModuleCapability {
            capability: CapabilitySpec::Name(name.to_string()),
            score,
        })
    }

    /// Activation callback for a capability taking `A`.
    pub fn activate<A: 'static>(&mut self, symbol: &str, f: ActivateFn<A>) -> BuildResult<'_, 'd> {
        self.send(Action::ModuleActivate {
            symbol: symbol.to_string(),
            callback: Callback::activate(f),
        })
    }

    /// Deactivation callback for a capability taking `A`.
    pub fn deactivate<A: 'static>(
        &mut self,
        symbol: &str,
        f: DeactivateFn<A>,
    ) -> BuildResult<'_, 'd> {
        self.send(Action::ModuleDeactivate {
            symbol: symbol.to_string(),
            callback: Callback::deactivate(f),
        })
    }

    /// Both callbacks at once.
    pub fn callbacks<A: 'static>(
        &mut self,
        activate_symbol: &str,
        activate: ActivateFn<A>,
        deactivate_symbol: &str,
        deactivate: DeactivateFn<A>,
    ) -> BuildResult<'_, 'd> {
        self.activate(activate_symbol, activate)?;
        self.deactivate(deactivate_symbol, deactivate)
    }

    /// Never unload this plugin's code.
    pub fn no_unload(&mut self) -> BuildResult<'_, 'd> {
        self.send(Action::NoUnload)
    }

    /// Translation domain.
    pub fn text_domain(&mut self, domain: &str) -> BuildResult<'_, 'd> {
        self.send(Action::TextDomain(domain.to_string()))
    }

    // --- configuration ---

    fn hint(&mut self, kind: HintKind, text: &str, longtext: Option<&str>) -> BuildResult<'_, 'd> {
        self.send_all(vec![
            Action::CreateConfig(ItemType::Hint(kind)),
            describe(text, longtext),
        ])
    }

    fn add(
        &mut self,
        item_type: ItemType,
        name: &str,
        default: ConfigValue,
        text: &str,
        longtext: Option<&str>,
    ) -> BuildResult<'_, 'd> {
        self.send_all(vec![
            Action::CreateConfig(item_type),
            Action::ConfigName(name.to_string()),
            Action::ConfigDefault(default),
            describe(text, longtext),
        ])
    }

    /// Preferences category.
    pub fn category(&mut self, text: &str) -> BuildResult<'_, 'd> {
        self.hint(HintKind::Category, text, None)
    }

    /// Preferences subcategory.
    pub fn subcategory(&mut self, text: &str) -> BuildResult<'_, 'd> {
        self.hint(HintKind::Subcategory, text, None)
    }

    /// Section separator.
    pub fn section(&mut self, text: &str, longtext: Option<&str>) -> BuildResult<'_, 'd> {
        self.hint(HintKind::Section, text, longtext)
    }

    /// Informational flag item.
    pub fn add_flag(&mut self, name: &str, text: &str) -> BuildResult<'_, 'd> {
        self.add(ItemType::Flag, name, ConfigValue::None, text, None)
    }

    /// Boolean item.
    pub fn add_bool(
        &mut self,
        name: &str,
        default: bool,
        text: &str,
        longtext: Option<&str>,
    ) -> BuildResult<'_, 'd> {
        self.add(ItemType::Bool, name, ConfigValue::Bool(default), text, longtext)
    }

    /// Integer item.
    pub fn add_integer(
        &mut self,
        name: &str,
        default: i64,
        text: &str,
        longtext: Option<&str>,
    ) -> BuildResult<'_, 'd> {
        self.add(
            ItemType::Integer(IntKind::Plain),
            name,
            ConfigValue::Int(default),
            text,
            longtext,
        )
    }

    /// Integer item clamped to `[min, max]`.
    pub fn add_integer_with_range(
        &mut self,
        name: &str,
        default: i64,
        min: i64,
        max: i64,
        text: &str,
        longtext: Option<&str>,
    ) -> BuildResult<'_, 'd> {
        self.add_integer(name, default, text, longtext)?
            .change_integer_range(min, max)
    }

    /// RGB colour item.
    pub fn add_rgb(&mut self, name: &str, default: i64, text: &str) -> BuildResult<'_, 'd> {
        self.add(
            ItemType::Integer(IntKind::Rgb),
            name,
            ConfigValue::Int(default),
            text,
            None,
        )?
        .change_integer_range(0, 0xff_ff_ff)
    }

    /// Float item.
    pub fn add_float(
        &mut self,
        name: &str,
        default: f64,
        text: &str,
        longtext: Option<&str>,
    ) -> BuildResult<'_, 'd> {
        self.add(ItemType::Float, name, ConfigValue::Float(default), text, longtext)
    }

    /// Float item clamped to `[min, max]`.
    pub fn add_float_with_range(
        &mut self,
        name: &str,
        default: f64,
        min: f64,
        max: f64,
        text: &str,
        longtext: Option<&str>,
    ) -> BuildResult<'_, 'd> {
        self.add_float(name, default, text, longtext)?
            .change_float_range(min, max)
    }

    /// Plain string item.
    pub fn add_string(
        &mut self,
        name: &str,
        default: Option<&str>,
        text: &str,
        longtext: Option<&str>,
    ) -> BuildResult<'_, 'd> {
        self.add_string_kind(StringKind::Plain, name, default, text, longtext)
    }

    /// String item of a specific presentation kind.
    pub fn add_string_kind(
        &mut self,
        kind: StringKind,
        name: &str,
        default: Option<&str>,
        text: &str,
        longtext: Option<&str>,
    ) -> BuildResult<'_, 'd> {
        self.add(
            ItemType::String(kind),
            name,
            ConfigValue::string(default),
            text,
            longtext,
        )
    }

    /// Item naming one module of `capability`.
    pub fn add_module(
        &mut self,
        name: &str,
        capability: &str,
        default: Option<&str>,
        text: &str,
        longtext: Option<&str>,
    ) -> BuildResult<'_, 'd> {
        self.add_string_kind(StringKind::ModuleSelect, name, default, text, longtext)?
            .send(Action::ConfigCapability(capability.to_string()))
    }

    /// Item naming a comma-separated list of modules of `capability`.
    pub fn add_module_list(
        &mut self,
        name: &str,
        capability: &str,
        default: Option<&str>,
        text: &str,
        longtext: Option<&str>,
    ) -> BuildResult<'_, 'd> {
        self.add_string_kind(StringKind::ModuleList, name, default, text, longtext)?
            .send(Action::ConfigCapability(capability.to_string()))
    }

    /// Obsolete option, accepted but ignored.
    pub fn add_obsolete(&mut self, item_type: ItemType, name: &str) -> BuildResult<'_, 'd> {
        self.send_all(vec![
            Action::CreateConfig(item_type),
            Action::ConfigName(name.to_string()),
            Action::ConfigRemoved,
        ])
    }

    /// Short option for the current item.
    pub fn change_short(&mut self, short: char) -> BuildResult<'_, 'd> {
        self.send(Action::ConfigShort(short))
    }

    /// Integer range for the current item.
    pub fn change_integer_range(&mut self, min: i64, max: i64) -> BuildResult<'_, 'd> {
        self.send(Action::ConfigRange {
            min: ConfigValue::Int(min),
            max: ConfigValue::Int(max),
        })
    }

    /// Float range for the current item.
    pub fn change_float_range(&mut self, min: f64, max: f64) -> BuildResult<'_, 'd> {
        self.send(Action::ConfigRange {
            min: ConfigValue::Float(min),
            max: ConfigValue::Float(max),
        })
    }

    /// Fixed string suggestions for the current item.
    pub fn change_string_list(&mut self, values: &[&str], texts: &[&str]) -> BuildResult<'_, 'd> {
        self.send(Action::ConfigStringList {
            values: values.iter().map(|s| s.to_string()).collect(),
            texts: texts.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Fixed integer suggestions for the current item.
    pub fn change_integer_list(&mut self, values: &[i64], texts: &[&str]) -> BuildResult<'_, 'd> {
        self.send(Action::ConfigIntList {
            values: values.to_vec(),
            texts: texts.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// String suggestions computed by `f`.
    pub fn change_string_cb(&mut self, symbol: &str, f: StringChoicesFn) -> BuildResult<'_, 'd> {
        self.send(Action::ConfigListCallback {
            symbol: symbol.to_string(),
            callback: Callback::string_choices(f),
        })
    }

    /// Integer suggestions computed by `f`.
    pub fn change_integer_cb(&mut self, symbol: &str, f: IntChoicesFn) -> BuildResult<'_, 'd> {
        self.send(Action::ConfigListCallback {
            symbol: symbol.to_string(),
            callback: Callback::int_choices(f),
        })
    }

    /// Never save the current item.
    pub fn change_volatile(&mut self) -> BuildResult<'_, 'd> {
        self.send(Action::ConfigVolatile)
    }

    /// Hide the current item.
    pub fn change_private(&mut self) -> BuildResult<'_, 'd> {
        self.send(Action::ConfigPrivate)
    }

    /// Let untrusted sources set the current item.
    pub fn change_safe(&mut self) -> BuildResult<'_, 'd> {
        self.send(Action::ConfigSafe)
    }
}

fn describe(text: &str, longtext: Option<&str>) -> Action {
    Action::ConfigDescription {
        text: text.to_string(),
        longtext: longtext.map(str::to_string),
    }
}
