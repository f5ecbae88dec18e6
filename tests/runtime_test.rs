//! Runtime lifecycle with dynamic plugins and settings overrides.

mod common;

use common::{touch_plugin, DemuxArgs};
use modbank::core_plugin::{OPT_PLUGINS_SCAN, OPT_RESET_PLUGINS_CACHE};
use modbank::{BankSettings, CapabilityId, RuntimeRegistry};
use serial_test::serial;

fn settings(dir: &std::path::Path) -> BankSettings {
    BankSettings::default().with_plugin_path(dir)
}

#[test]
fn test_acquire_discovers_plugins() {
    let dir = tempfile::tempdir().unwrap();
    touch_plugin(dir.path(), "mp4");
    touch_plugin(dir.path(), "avi");
    let opener = common::opener();
    let runtime = RuntimeRegistry::builder()
        .opener(opener.clone())
        .static_plugin(common::ranked)
        .settings(BankSettings {
            reset_cache: Some(true),
            ..settings(dir.path())
        })
        .build();

    let bank = runtime.acquire().unwrap();
    assert_eq!(opener.opens(), 2);
    assert_eq!(bank.plugins()[0].name(), "core");
    assert!(bank.module_exists("high"));
    assert!(bank.module_exists("mp4"));
    assert!(bank.config().get_bool(OPT_RESET_PLUGINS_CACHE).unwrap());
    assert!(dir.path().join("plugins.cache.json").exists());

    // Sharing the bank does not discover again.
    let again = runtime.acquire().unwrap();
    assert_eq!(opener.opens(), 2);
    assert_eq!(runtime.usage(), 2);
    drop(again);
    drop(bank);
    assert!(!runtime.is_loaded());
}

#[test]
fn test_option_redirects_selection() {
    let dir = tempfile::tempdir().unwrap();
    touch_plugin(dir.path(), "mp4");
    touch_plugin(dir.path(), "avi");
    let runtime = RuntimeRegistry::builder()
        .opener(common::opener())
        .settings(settings(dir.path()))
        .build();
    let bank = runtime.acquire().unwrap();

    bank.config().set_string("demux", Some("avi")).unwrap();
    let mut args = DemuxArgs {
        accept: vec!["mp4", "avi"],
        ..Default::default()
    };
    let selected = bank
        .select(&CapabilityId::Demux.into(), "$demux", false, &mut args)
        .unwrap();
    assert_eq!(selected.name(), "avi");
    assert_eq!(args.probed, vec!["avi"]);

    let choices = bank.string_choices("demux").unwrap();
    let values: Vec<&str> = choices.iter().map(|(v, _)| v.as_str()).collect();
    assert_eq!(values, vec!["any", "mp4", "avi", "none"]);
}

#[test]
fn test_integer_choices_from_plugin() {
    let dir = tempfile::tempdir().unwrap();
    touch_plugin(dir.path(), "avi");
    let runtime = RuntimeRegistry::builder()
        .opener(common::opener())
        .settings(settings(dir.path()))
        .build();
    let bank = runtime.acquire().unwrap();
    let choices = bank.int_choices("avi-index").unwrap();
    assert_eq!(choices[1], (1, "Always".to_string()));
}

#[test]
#[serial]
fn test_environment_disables_scan() {
    let dir = tempfile::tempdir().unwrap();
    touch_plugin(dir.path(), "mp4");
    std::env::set_var("MODBANK_SCAN", "false");
    let loaded = BankSettings::load();
    std::env::remove_var("MODBANK_SCAN");
    let loaded = loaded.unwrap();
    assert_eq!(loaded.scan, Some(false));

    let opener = common::opener();
    let runtime = RuntimeRegistry::builder()
        .opener(opener.clone())
        .settings(BankSettings {
            plugin_paths: vec![dir.path().to_path_buf()],
            ..loaded
        })
        .build();
    let bank = runtime.acquire().unwrap();
    assert!(!bank.config().get_bool(OPT_PLUGINS_SCAN).unwrap());
    assert_eq!(opener.opens(), 0);
    assert!(!bank.module_exists("mp4"));
}
