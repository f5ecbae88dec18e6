//! Capability index.
//!
//! Modules are bucketed by capability as their plugin is registered, without
//! sorting. [`CapabilityIndex::sort_all`] orders every bucket by descending
//! score in one pass once discovery is complete. Equal scores keep no
//! particular order.

use crate::bank::ModuleRef;
use modbank_core::{Capability, CapabilityId};
use std::collections::BTreeMap;

/// Capability to candidate modules.
#[derive(Debug)]
pub struct CapabilityIndex {
    builtin: Vec<Vec<ModuleRef>>,
    custom: BTreeMap<String, Vec<ModuleRef>>,
    sorted: bool,
}

impl Default for CapabilityIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityIndex {
    /// Empty index with one bucket per built-in capability.
    pub fn new() -> Self {
        Self {
            builtin: vec![Vec::new(); CapabilityId::COUNT],
            custom: BTreeMap::new(),
            sorted: true,
        }
    }

    /// Append a module to its capability's bucket.
    ///
    /// Invalid-capability modules are not indexed.
    pub fn insert(&mut self, module: ModuleRef) {
        let bucket = match &module.capability {
            Capability::Invalid => return,
            Capability::Builtin(id) => &mut self.builtin[id.slot()],
            Capability::Custom(name) => self.custom.entry(name.clone()).or_default(),
        };
        bucket.push(module);
        self.sorted = false;
    }

    /// Sort every bucket by descending score.
    pub fn sort_all(&mut self) {
        for bucket in self.builtin.iter_mut().chain(self.custom.values_mut()) {
            bucket.sort_unstable_by(|a, b| b.score.cmp(&a.score));
        }
        self.sorted = true;
    }

    /// Whether every bucket is sorted.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Candidates for `capability`, highest score first.
    pub fn list(&self, capability: &Capability) -> &[ModuleRef] {
        match capability {
            Capability::Invalid => &[],
            Capability::Builtin(id) => &self.builtin[id.slot()],
            Capability::Custom(name) => self.custom.get(name).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    /// Whether any module provides `capability`.
    pub fn has_capability(&self, capability: &Capability) -> bool {
        !self.list(capability).is_empty()
    }

    /// Every indexed module, built-in capabilities first.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleRef> {
        self.builtin
            .iter()
            .chain(self.custom.values())
            .flat_map(|bucket| bucket.iter())
    }

    /// Number of indexed modules.
    pub fn len(&self) -> usize {
        self.builtin.iter().chain(self.custom.values()).map(Vec::len).sum()
    }

    /// Whether no module is indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Custom capability names in order.
    pub fn custom_capabilities(&self) -> impl Iterator<Item = &str> {
        self.custom.keys().map(String::as_str)
    }

    /// Drop every bucket.
    pub fn clear(&mut self) {
        self.builtin.iter_mut().for_each(Vec::clear);
        self.custom.clear();
        self.sorted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::describe::{Module, PluginDescription};
    use crate::bank::{Plugin, PluginOrigin};
    use std::sync::Arc;

    fn plugin(id: usize, modules: Vec<(Capability, i32)>) -> Arc<Plugin> {
        let description = PluginDescription {
            modules: modules
                .into_iter()
                .enumerate()
                .map(|(i, (capability, score))| Module {
                    shortcuts: vec![format!("p{}m{}", id, i)],
                    capability,
                    score,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };
        let origin = PluginOrigin::Dynamic {
            path: format!("/p{}_plugin.so", id).into(),
            mtime: 0,
            size: 0,
        };
        Arc::new(Plugin::new(id, origin, &description, Vec::new()))
    }

    fn index_all(index: &mut CapabilityIndex, plugin: &Arc<Plugin>) {
        for i in 0..plugin.modules.len() {
            index.insert(ModuleRef::new(Arc::clone(plugin), i));
        }
    }

    #[test]
    fn test_custom_capability_sorted_by_score() {
        let mut index = CapabilityIndex::new();
        for (id, score) in [(0, 5), (1, 20), (2, 1)] {
            index_all(&mut index, &plugin(id, vec![(Capability::custom("my-cap"), score)]));
        }
        assert!(!index.is_sorted());
        index.sort_all();
        let scores: Vec<i32> = index
            .list(&Capability::custom("my-cap"))
            .iter()
            .map(|m| m.score)
            .collect();
        assert_eq!(scores, vec![20, 5, 1]);
    }

    #[test]
    fn test_builtin_buckets_non_increasing() {
        let mut index = CapabilityIndex::new();
        let demux = Capability::Builtin(CapabilityId::Demux);
        index_all(
            &mut index,
            &plugin(0, vec![(demux.clone(), 10), (demux.clone(), 300), (demux.clone(), 10)]),
        );
        index_all(&mut index, &plugin(1, vec![(demux.clone(), 50)]));
        index.sort_all();
        let list = index.list(&demux);
        assert_eq!(list.len(), 4);
        assert!(list.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(!index.has_capability(&Capability::Builtin(CapabilityId::Access)));
    }

    #[test]
    fn test_invalid_modules_not_indexed() {
        let mut index = CapabilityIndex::new();
        index_all(
            &mut index,
            &plugin(
                0,
                vec![
                    (Capability::Invalid, 0),
                    (Capability::Builtin(CapabilityId::Access), 10),
                ],
            ),
        );
        index.sort_all();
        assert_eq!(index.len(), 1);
        assert!(index.list(&Capability::Invalid).is_empty());
        assert!(index.iter().all(|m| !m.capability.is_invalid()));
    }

    #[test]
    fn test_clear() {
        let mut index = CapabilityIndex::new();
        index_all(&mut index, &plugin(0, vec![(Capability::custom("x"), 1)]));
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.custom_capabilities().count(), 0);
    }
}
