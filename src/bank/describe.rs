//! Symbol-name mode description.
//!
//! [`Describer`] consumes a plugin's action stream and builds a
//! [`PluginDescription`]: modules and configuration items with every callback
//! recorded by symbol name only. Nothing here calls into plugin code beyond
//! the entry point itself, so a description can be produced, cached and
//! listed without resolving any callback.

use modbank_core::{Capability, CapabilityId, Choices, ConfigItem, ConfigValue, ItemClass, ItemType};
use modbank_plugin_api::{Action, CapabilitySpec, DescribeError, Descriptor, Handle, PluginEntry};
use serde::{Deserialize, Serialize};

/// One selectable unit within a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Module {
    /// Names the module answers to; index 0 is canonical.
    pub shortcuts: Vec<String>,
    /// Short human-readable name.
    #[serde(default)]
    pub shortname: Option<String>,
    /// Long human-readable name.
    #[serde(default)]
    pub longname: Option<String>,
    /// Help text.
    #[serde(default)]
    pub help: Option<String>,
    /// Advertised capability.
    #[serde(default)]
    pub capability: Capability,
    /// Priority among modules of the same capability.
    #[serde(default)]
    pub score: i32,
    /// Symbol of the activation callback.
    #[serde(default)]
    pub activate: Option<String>,
    /// Symbol of the deactivation callback.
    #[serde(default)]
    pub deactivate: Option<String>,
}

impl Module {
    /// Canonical name.
    pub fn name(&self) -> &str {
        self.shortcuts.first().map(String::as_str).unwrap_or("")
    }

    /// Long name, falling back to the canonical name.
    pub fn long_name(&self) -> &str {
        self.longname.as_deref().unwrap_or_else(|| self.name())
    }

    /// Whether any shortcut equals `name`, ignoring ASCII case.
    pub fn has_shortcut(&self, name: &str) -> bool {
        self.shortcuts.iter().any(|s| s.eq_ignore_ascii_case(name))
    }
}

/// Everything a plugin declares, with callbacks known by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDescription {
    /// Translation domain.
    #[serde(default)]
    pub textdomain: Option<String>,
    /// Modules in declaration order.
    pub modules: Vec<Module>,
    /// Configuration items in declaration order.
    pub config: Vec<ConfigItem>,
    /// Whether the code may be unloaded at teardown.
    pub unloadable: bool,
}

impl Default for PluginDescription {
    fn default() -> Self {
        Self {
            textdomain: None,
            modules: Vec::new(),
            config: Vec::new(),
            unloadable: true,
        }
    }
}

impl PluginDescription {
    /// Canonical name of the first module, used to label the plugin.
    pub fn name(&self) -> &str {
        self.modules.first().map(Module::name).unwrap_or("")
    }

    /// Number of items that are options rather than grouping hints.
    pub fn option_count(&self) -> usize {
        self.config
            .iter()
            .filter(|item| !item.item_type.is_hint())
            .count()
    }

    /// Number of boolean items.
    pub fn bool_count(&self) -> usize {
        self.config
            .iter()
            .filter(|item| item.item_type == ItemType::Bool)
            .count()
    }
}

/// Descriptor building a [`PluginDescription`].
#[derive(Debug, Default)]
pub struct Describer {
    description: PluginDescription,
}

impl Describer {
    /// Empty describer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate what was collected and return it.
    pub fn finish(self) -> Result<PluginDescription, DescribeError> {
        if let Some(index) = self
            .description
            .modules
            .iter()
            .position(|m| m.shortcuts.is_empty())
        {
            return Err(DescribeError::UnnamedModule { index });
        }
        if self
            .description
            .config
            .iter()
            .any(|item| !item.item_type.is_hint() && item.name.is_none())
        {
            return Err(DescribeError::UnnamedConfig);
        }
        Ok(self.description)
    }

    fn module(&mut self) -> Result<&mut Module, DescribeError> {
        self.description
            .modules
            .last_mut()
            .ok_or(DescribeError::NoModule)
    }

    fn named_module(&mut self) -> Result<&mut Module, DescribeError> {
        let index = self.description.modules.len().saturating_sub(1);
        let module = self.module()?;
        if module.shortcuts.is_empty() {
            return Err(DescribeError::UnnamedModule { index });
        }
        Ok(module)
    }

    fn item(&mut self) -> Result<&mut ConfigItem, DescribeError> {
        self.description
            .config
            .last_mut()
            .ok_or(DescribeError::NoConfigItem)
    }

    fn apply_module(&mut self, action: Action) -> Result<Handle, DescribeError> {
        match action {
            Action::CreateModule => {
                self.description.modules.push(Module::default());
                return Ok(Handle::Module(self.description.modules.len() - 1));
            }
            Action::ModuleName(name) => {
                if name.is_empty() {
                    return Err(DescribeError::EmptyModuleName);
                }
                let module = self.module()?;
                if module.longname.is_none() {
                    module.longname = Some(name.clone());
                }
                match module.shortcuts.first_mut() {
                    Some(first) => *first = name,
                    None => module.shortcuts.push(name),
                }
            }
            Action::ModuleShortcuts(names) => self.named_module()?.shortcuts.extend(names),
            Action::ModuleShortName(text) => self.named_module()?.shortname = Some(text),
            Action::ModuleDescription(text) => self.named_module()?.longname = Some(text),
            Action::ModuleHelp(text) => self.named_module()?.help = Some(text),
            Action::ModuleCapability { capability, score } => {
                let module = self.named_module()?;
                let capability = match capability {
                    CapabilitySpec::Id(raw) => CapabilityId::from_raw(raw)
                        .map(Capability::Builtin)
                        .ok_or_else(|| DescribeError::InvalidCapability {
                            module: module.name().to_string(),
                            raw,
                        })?,
                    CapabilitySpec::Name(name) => Capability::parse(&name),
                };
                module.capability = capability;
                module.score = score;
            }
            Action::ModuleActivate { symbol, .. } => {
                self.named_module()?.activate = Some(symbol)
            }
            Action::ModuleDeactivate { symbol, .. } => {
                self.named_module()?.deactivate = Some(symbol)
            }
            Action::NoUnload => self.description.unloadable = false,
            Action::TextDomain(domain) => self.description.textdomain = Some(domain),
            other => {
                return Err(DescribeError::Unsupported {
                    target: self
                        .description
                        .modules
                        .last()
                        .map(Module::name)
                        .unwrap_or_default()
                        .to_string(),
                    action: other.id(),
                })
            }
        }
        Ok(Handle::None)
    }

    fn apply_config(&mut self, action: Action) -> Result<Handle, DescribeError> {
        if let Action::CreateConfig(item_type) = action {
            self.description.config.push(ConfigItem::new(item_type));
            return Ok(Handle::Config(self.description.config.len() - 1));
        }

        let item = self.item()?;
        let name = item.name_str().to_string();
        match action {
            Action::ConfigName(new_name) => {
                if new_name.is_empty() {
                    return Err(DescribeError::EmptyConfigName);
                }
                item.name = Some(new_name);
            }
            Action::ConfigDefault(value) => {
                let value = match value {
                    ConfigValue::Str(s) => ConfigValue::string(s.as_deref()),
                    other => other,
                };
                expect_class(&name, "default value", item.class(), &value)?;
                item.default = value;
            }
            Action::ConfigRange { min, max } => {
                let class = item.class();
                if !matches!(class, ItemClass::Integer | ItemClass::Float) {
                    return Err(DescribeError::RangeNotNumeric(name));
                }
                expect_class(&name, "range", class, &min)?;
                expect_class(&name, "range", class, &max)?;
                item.min = min;
                item.max = max;
            }
            Action::ConfigShort(short) => {
                if matches!(short, '\0' | '?' | ':') {
                    return Err(DescribeError::InvalidShort { name, short });
                }
                item.short = Some(short);
            }
            Action::ConfigDescription { text, longtext } => {
                item.text = Some(text);
                item.longtext = longtext;
            }
            Action::ConfigStringList { values, texts } => {
                check_choices(item, &name, ItemClass::String, "string list")?;
                if values.len() != texts.len() {
                    return Err(DescribeError::ChoicesLengthMismatch(name));
                }
                item.choices = Choices::Strings { values, texts };
            }
            Action::ConfigIntList { values, texts } => {
                check_choices(item, &name, ItemClass::Integer, "integer list")?;
                if values.len() != texts.len() {
                    return Err(DescribeError::ChoicesLengthMismatch(name));
                }
                item.choices = Choices::Integers { values, texts };
            }
            Action::ConfigListCallback { symbol, callback } => {
                let fits = match item.class() {
                    ItemClass::String => callback.as_string_choices().is_some(),
                    ItemClass::Integer => callback.as_int_choices().is_some(),
                    _ => false,
                };
                if !fits {
                    return Err(DescribeError::ChoicesWrongType {
                        name,
                        what: "choice callback",
                    });
                }
                if item.choices.is_set() {
                    return Err(DescribeError::ChoicesAlreadySet(name));
                }
                item.choices = Choices::Callback { symbol };
            }
            Action::ConfigCapability(capability) => match item.item_type {
                ItemType::String(kind) if kind.is_module() => item.capability = Some(capability),
                _ => return Err(DescribeError::CapabilityNotModule(name)),
            },
            Action::ConfigVolatile => item.unsaveable = true,
            Action::ConfigPrivate => item.internal = true,
            Action::ConfigRemoved => item.removed = true,
            Action::ConfigSafe => item.safe = true,
            other => {
                return Err(DescribeError::Unsupported {
                    target: name,
                    action: other.id(),
                })
            }
        }
        Ok(Handle::None)
    }
}

impl Descriptor for Describer {
    fn apply(&mut self, action: Action) -> Result<Handle, DescribeError> {
        if action.is_config_action() {
            self.apply_config(action)
        } else {
            self.apply_module(action)
        }
    }
}

fn expect_class(
    name: &str,
    what: &'static str,
    class: ItemClass,
    value: &ConfigValue,
) -> Result<(), DescribeError> {
    if value.class() == class {
        Ok(())
    } else {
        Err(DescribeError::WrongValueType {
            name: name.to_string(),
            what,
            expected: class.label(),
        })
    }
}

fn check_choices(
    item: &ConfigItem,
    name: &str,
    class: ItemClass,
    what: &'static str,
) -> Result<(), DescribeError> {
    if item.class() != class {
        return Err(DescribeError::ChoicesWrongType {
            name: name.to_string(),
            what,
        });
    }
    if item.choices.is_set() {
        return Err(DescribeError::ChoicesAlreadySet(name.to_string()));
    }
    Ok(())
}

/// Describe a plugin in symbol-name mode.
pub fn describe(entry: PluginEntry) -> Result<PluginDescription, DescribeError> {
    let mut describer = Describer::new();
    entry(&mut describer)?;
    describer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use modbank_core::{ProbeInfo, ProbeStatus, StringKind};
    use modbank_plugin_api::{describe_with, PluginBuilder};

    struct Args;

    fn open(_: &mut Args, _: &ProbeInfo<'_>) -> ProbeStatus {
        ProbeStatus::Accepted
    }

    fn close(_: &mut Args) {}

    fn fonts(_: &str) -> Vec<(String, String)> {
        Vec::new()
    }

    fn mp4_body(b: &mut PluginBuilder<'_>) -> Result<(), DescribeError> {
        b.module("mp4")?
            .shortcuts(&["iso"])?
            .capability(CapabilityId::Demux, 50)?
            .callbacks::<Args>("open_mp4", open, "close_mp4", close)?;
        b.module("mp4-lite")?
            .capability(CapabilityId::Demux, 10)?
            .shortcuts(&["mp4"])?;
        b.add_bool("mp4-audio-only", false, "Audio only", None)?;
        b.add_integer_with_range("mp4-tracks", 4, 1, 16, "Tracks", None)?
            .change_short('t')?;
        Ok(())
    }

    fn mp4(d: &mut dyn Descriptor) -> Result<(), DescribeError> {
        describe_with(d, mp4_body)
    }

    fn run(actions: Vec<Action>) -> Result<PluginDescription, DescribeError> {
        let mut describer = Describer::new();
        for action in actions {
            describer.apply(action)?;
        }
        describer.finish()
    }

    #[test]
    fn test_describe_modules_and_items() {
        let desc = describe(mp4).unwrap();
        assert_eq!(desc.modules.len(), 2);
        let first = &desc.modules[0];
        assert_eq!(first.shortcuts, vec!["mp4", "iso"]);
        assert_eq!(first.long_name(), "mp4");
        assert_eq!(first.capability, Capability::Builtin(CapabilityId::Demux));
        assert_eq!(first.activate.as_deref(), Some("open_mp4"));
        assert_eq!(first.deactivate.as_deref(), Some("close_mp4"));
        assert_eq!(desc.config.len(), 2);
        assert_eq!(desc.bool_count(), 1);
        assert_eq!(desc.config[1].short, Some('t'));
        assert_eq!(desc.config[1].clamp_int(99), 16);
        assert!(desc.unloadable);
    }

    #[test]
    fn test_describe_is_idempotent() {
        assert_eq!(describe(mp4).unwrap(), describe(mp4).unwrap());
    }

    #[test]
    fn test_module_property_before_module() {
        let err = run(vec![Action::ModuleHelp("x".into())]).unwrap_err();
        assert_eq!(err, DescribeError::NoModule);
    }

    #[test]
    fn test_module_property_before_name() {
        let err = run(vec![
            Action::CreateModule,
            Action::ModuleCapability {
                capability: CapabilitySpec::Id(10),
                score: 1,
            },
        ])
        .unwrap_err();
        assert_eq!(err, DescribeError::UnnamedModule { index: 0 });
        assert_eq!(
            run(vec![Action::CreateModule]).unwrap_err(),
            DescribeError::UnnamedModule { index: 0 }
        );
        assert_eq!(
            run(vec![
                Action::CreateModule,
                Action::ModuleName("first".into()),
                Action::CreateModule,
            ])
            .unwrap_err(),
            DescribeError::UnnamedModule { index: 1 }
        );
        assert_eq!(
            run(vec![Action::CreateModule, Action::ModuleName(String::new())]).unwrap_err(),
            DescribeError::EmptyModuleName
        );
    }

    #[test]
    fn test_capability_sentinels_rejected() {
        for raw in [CapabilityId::INVALID, CapabilityId::MAX] {
            let err = run(vec![
                Action::CreateModule,
                Action::ModuleName("m".into()),
                Action::ModuleCapability {
                    capability: CapabilitySpec::Id(raw),
                    score: 1,
                },
            ])
            .unwrap_err();
            assert_eq!(
                err,
                DescribeError::InvalidCapability {
                    module: "m".into(),
                    raw
                }
            );
            assert!(err.to_string().contains("module m"));
        }
    }

    #[test]
    fn test_named_capability_prefers_builtin() {
        let desc = run(vec![
            Action::CreateModule,
            Action::ModuleName("a".into()),
            Action::ModuleCapability {
                capability: CapabilitySpec::Name("demux".into()),
                score: 1,
            },
            Action::CreateModule,
            Action::ModuleName("b".into()),
            Action::ModuleCapability {
                capability: CapabilitySpec::Name("my-cap".into()),
                score: 1,
            },
        ])
        .unwrap();
        assert_eq!(
            desc.modules[0].capability,
            Capability::Builtin(CapabilityId::Demux)
        );
        assert_eq!(desc.modules[1].capability, Capability::Custom("my-cap".into()));
    }

    #[test]
    fn test_unnamed_config_rejected_except_hints() {
        let ok = run(vec![Action::CreateConfig(ItemType::Hint(
            modbank_core::HintKind::Category,
        ))]);
        assert!(ok.is_ok());
        let err = run(vec![Action::CreateConfig(ItemType::Bool)]).unwrap_err();
        assert_eq!(err, DescribeError::UnnamedConfig);
    }

    #[test]
    fn test_range_requires_numeric_item() {
        let err = run(vec![
            Action::CreateConfig(ItemType::Bool),
            Action::ConfigName("b".into()),
            Action::ConfigRange {
                min: ConfigValue::Int(0),
                max: ConfigValue::Int(1),
            },
        ])
        .unwrap_err();
        assert_eq!(err, DescribeError::RangeNotNumeric("b".into()));
    }

    #[test]
    fn test_choices_are_set_once() {
        let err = run(vec![
            Action::CreateConfig(ItemType::String(StringKind::Plain)),
            Action::ConfigName("s".into()),
            Action::ConfigStringList {
                values: vec!["a".into()],
                texts: vec!["A".into()],
            },
            Action::ConfigListCallback {
                symbol: "fonts".into(),
                callback: modbank_core::Callback::string_choices(fonts),
            },
        ])
        .unwrap_err();
        assert_eq!(err, DescribeError::ChoicesAlreadySet("s".into()));
    }

    #[test]
    fn test_choices_wrong_type() {
        let err = run(vec![
            Action::CreateConfig(ItemType::Float),
            Action::ConfigName("f".into()),
            Action::ConfigIntList {
                values: vec![1],
                texts: vec!["one".into()],
            },
        ])
        .unwrap_err();
        assert!(matches!(err, DescribeError::ChoicesWrongType { .. }));

        let err = run(vec![
            Action::CreateConfig(ItemType::Integer(modbank_core::IntKind::Plain)),
            Action::ConfigName("i".into()),
            Action::ConfigListCallback {
                symbol: "fonts".into(),
                callback: modbank_core::Callback::string_choices(fonts),
            },
        ])
        .unwrap_err();
        assert!(matches!(err, DescribeError::ChoicesWrongType { .. }));
    }

    #[test]
    fn test_callback_choices_recorded_by_symbol() {
        let desc = run(vec![
            Action::CreateConfig(ItemType::String(StringKind::Font)),
            Action::ConfigName("font".into()),
            Action::ConfigListCallback {
                symbol: "fonts".into(),
                callback: modbank_core::Callback::string_choices(fonts),
            },
        ])
        .unwrap();
        assert_eq!(
            desc.config[0].choices,
            Choices::Callback {
                symbol: "fonts".into()
            }
        );
    }

    #[test]
    fn test_invalid_short_options() {
        for short in ['\0', '?', ':'] {
            let err = run(vec![
                Action::CreateConfig(ItemType::Bool),
                Action::ConfigName("b".into()),
                Action::ConfigShort(short),
            ])
            .unwrap_err();
            assert!(matches!(err, DescribeError::InvalidShort { .. }));
        }
    }

    #[test]
    fn test_default_type_checked() {
        let err = run(vec![
            Action::CreateConfig(ItemType::Bool),
            Action::ConfigName("b".into()),
            Action::ConfigDefault(ConfigValue::Int(1)),
        ])
        .unwrap_err();
        assert!(matches!(err, DescribeError::WrongValueType { .. }));
    }

    #[test]
    fn test_capability_requires_module_item() {
        let err = run(vec![
            Action::CreateConfig(ItemType::String(StringKind::Plain)),
            Action::ConfigName("s".into()),
            Action::ConfigCapability("demux".into()),
        ])
        .unwrap_err();
        assert_eq!(err, DescribeError::CapabilityNotModule("s".into()));
    }

    #[test]
    fn test_no_unload_and_text_domain() {
        let desc = run(vec![Action::NoUnload, Action::TextDomain("modbank-demo".into())]).unwrap();
        assert!(!desc.unloadable);
        assert_eq!(desc.textdomain.as_deref(), Some("modbank-demo"));
    }
}
