//! Symbol-address mode description.
//!
//! [`SymbolCollector`] runs the same entry point as the describer but keeps
//! only `(symbol, callback)` pairs. The resulting [`SymbolTable`] is sorted
//! once and searched by binary search when callbacks named in a description
//! are resolved.

use modbank_core::Callback;
use modbank_plugin_api::{Action, DescribeError, Descriptor, Handle, PluginEntry};

/// Descriptor recording every named callback.
#[derive(Debug, Default)]
pub struct SymbolCollector {
    symbols: Vec<(String, Callback)>,
    modules: usize,
    items: usize,
}

impl SymbolCollector {
    /// Empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort the collected pairs into a table.
    pub fn finish(self) -> SymbolTable {
        SymbolTable::new(self.symbols)
    }
}

impl Descriptor for SymbolCollector {
    fn apply(&mut self, action: Action) -> Result<Handle, DescribeError> {
        match action {
            Action::CreateModule => {
                self.modules += 1;
                return Ok(Handle::Module(self.modules - 1));
            }
            Action::CreateConfig(_) => {
                self.items += 1;
                return Ok(Handle::Config(self.items - 1));
            }
            Action::ModuleActivate { symbol, callback }
            | Action::ModuleDeactivate { symbol, callback }
            | Action::ConfigListCallback { symbol, callback } => {
                self.symbols.push((symbol, callback));
            }
            _ => {}
        }
        Ok(Handle::None)
    }
}

/// Name-sorted callback table of one plugin.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: Vec<(String, Callback)>,
}

impl SymbolTable {
    /// Build a table; the first registration of a duplicated name wins.
    pub fn new(mut entries: Vec<(String, Callback)>) -> Self {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.dedup_by(|later, earlier| later.0 == earlier.0);
        Self { entries }
    }

    /// Callback registered under `symbol`.
    pub fn lookup(&self, symbol: &str) -> Option<&Callback> {
        self.entries
            .binary_search_by(|(name, _)| name.as_str().cmp(symbol))
            .ok()
            .map(|i| &self.entries[i].1)
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Describe a plugin in symbol-address mode.
pub fn collect_symbols(entry: PluginEntry) -> Result<SymbolTable, DescribeError> {
    let mut collector = SymbolCollector::new();
    entry(&mut collector)?;
    Ok(collector.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modbank_core::{CapabilityId, ProbeInfo, ProbeStatus};
    use modbank_plugin_api::describe_with;

    struct Args(u32);

    fn open_a(args: &mut Args, _: &ProbeInfo<'_>) -> ProbeStatus {
        args.0 = 1;
        ProbeStatus::Accepted
    }

    fn open_b(args: &mut Args, _: &ProbeInfo<'_>) -> ProbeStatus {
        args.0 = 2;
        ProbeStatus::Accepted
    }

    fn codes(_: &str) -> Vec<(i64, String)> {
        vec![(1, "one".into())]
    }

    fn entry(d: &mut dyn Descriptor) -> Result<(), DescribeError> {
        describe_with(d, |b| {
            b.module("b")?
                .capability(CapabilityId::VideoDecoder, 1)?
                .activate::<Args>("open_b", open_b)?;
            b.module("a")?
                .capability(CapabilityId::VideoDecoder, 1)?
                .activate::<Args>("open_a", open_a)?;
            b.add_integer("codes", 1, "Codes", None)?
                .change_integer_cb("codes", codes)?;
            Ok(())
        })
    }

    #[test]
    fn test_collects_every_named_callback() {
        let table = collect_symbols(entry).unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.lookup("missing").is_none());

        let info = ProbeInfo {
            module: "a",
            forced: false,
        };
        let mut args = Args(0);
        let f = table.lookup("open_a").unwrap().as_activate::<Args>().unwrap();
        f(&mut args, &info);
        assert_eq!(args.0, 1);
        let f = table.lookup("open_b").unwrap().as_activate::<Args>().unwrap();
        f(&mut args, &info);
        assert_eq!(args.0, 2);
        assert!(table.lookup("codes").unwrap().as_int_choices().is_some());
    }

    #[test]
    fn test_duplicate_symbol_keeps_one_entry() {
        let table = SymbolTable::new(vec![
            ("x".into(), Callback::int_choices(codes)),
            ("x".into(), Callback::int_choices(codes)),
        ]);
        assert_eq!(table.len(), 1);
    }
}
