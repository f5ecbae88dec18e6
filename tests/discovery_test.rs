//! Directory discovery, plugin cache and lazy mapping.

mod common;

use common::{touch_plugin, DemuxArgs, FakeOpener};
use modbank::bank::{describe, DiscoveryMode, PluginCache};
use modbank::{Bank, CapabilityId};
use std::sync::Arc;
use std::time::Duration;

const CACHE: &str = "plugins.cache.json";

fn discover(opener: &Arc<FakeOpener>, dir: &std::path::Path, mode: DiscoveryMode) -> Bank {
    let mut bank = Bank::new(opener.clone());
    bank.discover(&[dir], 5, CACHE, mode);
    bank.sort();
    bank
}

#[test]
fn test_reset_writes_cache_then_reuse_skips_loading() {
    let dir = tempfile::tempdir().unwrap();
    touch_plugin(dir.path(), "mp4");
    touch_plugin(dir.path(), "avi");
    let opener = common::opener();

    let bank = discover(&opener, dir.path(), DiscoveryMode::from_options(true, true, true));
    assert_eq!(opener.opens(), 2);
    assert_eq!(bank.plugins().len(), 2);
    // Described in fast mode and closed again.
    assert!(bank.plugins().iter().all(|p| p.mapping().is_none()));

    let cache = PluginCache::load(&dir.path().join(CACHE)).unwrap();
    assert_eq!(cache.len(), 2);

    opener.reset();
    let bank = discover(&opener, dir.path(), DiscoveryMode::from_options(true, true, false));
    assert_eq!(opener.opens(), 0);
    let demuxers = bank.list(&CapabilityId::Demux.into());
    assert_eq!(demuxers.len(), 2);
    assert_eq!(demuxers[0].name(), "mp4");
    assert_eq!(demuxers[1].name(), "avi");
    assert!(bank.config().find("avi-index").is_some());
}

#[test]
fn test_changed_file_is_described_again() {
    let dir = tempfile::tempdir().unwrap();
    let mp4 = touch_plugin(dir.path(), "mp4");
    touch_plugin(dir.path(), "avi");
    let opener = common::opener();
    discover(&opener, dir.path(), DiscoveryMode::from_options(true, true, true));

    std::fs::write(&mp4, b"a rebuilt plugin").unwrap();
    opener.reset();
    let bank = discover(&opener, dir.path(), DiscoveryMode::from_options(true, true, false));
    assert_eq!(opener.opens(), 1);
    assert_eq!(bank.plugins().len(), 2);

    // Loaded in safe mode, so it is already mapped.
    let mp4 = bank.find_module("mp4").unwrap();
    assert!(mp4.plugin().mapping().is_some_and(|m| m.is_loaded()));

    // The cache is only rewritten on reset.
    opener.reset();
    discover(&opener, dir.path(), DiscoveryMode::from_options(true, true, false));
    assert_eq!(opener.opens(), 1);
}

#[test]
fn test_without_scan_cached_plugins_are_trusted() {
    let dir = tempfile::tempdir().unwrap();
    let avi = touch_plugin(dir.path(), "avi");
    let opener = common::opener();
    discover(&opener, dir.path(), DiscoveryMode::from_options(true, true, true));

    std::fs::remove_file(&avi).unwrap();
    touch_plugin(dir.path(), "ranked");
    opener.reset();
    let bank = discover(&opener, dir.path(), DiscoveryMode::from_options(true, false, false));
    assert_eq!(opener.opens(), 0);
    assert!(bank.module_exists("avi"));
    assert!(!bank.module_exists("high"));
}

#[test]
fn test_cache_disabled_loads_everything() {
    let dir = tempfile::tempdir().unwrap();
    touch_plugin(dir.path(), "mp4");
    let opener = common::opener();
    discover(&opener, dir.path(), DiscoveryMode::from_options(true, true, true));

    opener.reset();
    let bank = discover(&opener, dir.path(), DiscoveryMode::from_options(false, true, false));
    assert_eq!(opener.opens(), 1);
    assert!(bank.module_exists("mp4"));
}

#[test]
fn test_unloadable_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    touch_plugin(dir.path(), "mp4");
    touch_plugin(dir.path(), "corrupt");
    std::fs::write(dir.path().join("readme.txt"), b"not a plugin").unwrap();
    let opener = common::opener();

    let mut bank = Bank::new(opener.clone());
    let count = bank.discover(&[dir.path()], 5, CACHE, DiscoveryMode::from_options(true, true, true));
    assert_eq!(count, 1);
    assert_eq!(opener.opens(), 2);
    let cache = PluginCache::load(&dir.path().join(CACHE)).unwrap();
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_nested_directories_respect_depth() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("demux").join("extra");
    std::fs::create_dir_all(&nested).unwrap();
    touch_plugin(&dir.path().join("demux"), "mp4");
    touch_plugin(&nested, "avi");
    let opener = common::opener();

    let mut bank = Bank::new(opener.clone());
    bank.discover(&[dir.path()], 2, CACHE, DiscoveryMode::from_options(false, true, false));
    assert!(bank.module_exists("mp4"));
    assert!(!bank.module_exists("avi"));
}

#[test]
fn test_concurrent_map_opens_once() {
    let dir = tempfile::tempdir().unwrap();
    touch_plugin(dir.path(), "mp4");
    let opener = Arc::new(FakeOpener::new().with_delay(Duration::from_millis(20)));
    discover(&opener, dir.path(), DiscoveryMode::from_options(true, true, true));

    opener.reset();
    let bank = discover(&opener, dir.path(), DiscoveryMode::from_options(true, true, false));
    let plugin = Arc::clone(&bank.plugins()[0]);
    assert!(plugin.mapping().is_none());

    let mappings: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8).map(|_| s.spawn(|| bank.map(&plugin).unwrap())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(opener.opens(), 1);
    assert!(mappings.iter().all(|m| Arc::ptr_eq(m, &mappings[0])));
}

#[test]
fn test_selecting_cached_module_maps_its_plugin() {
    let dir = tempfile::tempdir().unwrap();
    touch_plugin(dir.path(), "mp4");
    touch_plugin(dir.path(), "avi");
    let opener = common::opener();
    discover(&opener, dir.path(), DiscoveryMode::from_options(true, true, true));

    opener.reset();
    let bank = discover(&opener, dir.path(), DiscoveryMode::from_options(true, true, false));
    let mut args = DemuxArgs {
        accept: vec!["avi"],
        ..Default::default()
    };
    let selected = bank
        .select(&CapabilityId::Demux.into(), "avi", false, &mut args)
        .unwrap();
    assert_eq!(selected.name(), "avi");
    assert_eq!(args.probed, vec!["avi"]);
    assert_eq!(opener.opens(), 1);
    assert!(bank.find_module("mp4").unwrap().plugin().mapping().is_none());
}

#[test]
fn test_describe_is_repeatable() {
    let first = describe(common::mp4).unwrap();
    let second = describe(common::mp4).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.modules[0].activate.as_deref(), Some("open_demux"));
    assert_eq!(first.modules[0].deactivate.as_deref(), Some("close_demux"));
}
