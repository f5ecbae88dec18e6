//! Configuration items and the registry holding their values.

mod item;
mod registry;

pub use item::{
    Choices, ConfigItem, ConfigValue, HintKind, IntKind, ItemClass, ItemType, StringKind,
};
pub use registry::{
    ChoiceContext, ConfigReader, ConfigRegistry, ConfigWriter, CHOICE_AUTOMATIC, CHOICE_DISABLE,
};
