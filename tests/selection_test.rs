//! Module selection over registered plugins.

mod common;

use common::DemuxArgs;
use modbank::{Bank, Capability, CapabilityId, ProbeStatus};

fn bank() -> Bank {
    let mut bank = Bank::new(common::opener());
    bank.register_static(common::ranked).unwrap();
    bank.register_static(common::mp4).unwrap();
    bank.register_static(common::avi).unwrap();
    bank.sort();
    bank
}

fn probe_order(bank: &Bank, names: &str, strict: bool) -> (Vec<String>, Option<String>) {
    let mut order = Vec::new();
    let selected = bank.select_with(&Capability::parse("ranked"), names, strict, |candidate| {
        order.push(candidate.module.name().to_string());
        ProbeStatus::Declined
    });
    (order, selected.map(|m| m.name().to_string()))
}

#[test]
fn test_any_probes_in_score_order() {
    let bank = bank();
    let (order, selected) = probe_order(&bank, "any", false);
    assert_eq!(order, vec!["high", "mid", "low"]);
    assert!(selected.is_none());
}

#[test]
fn test_named_then_fallback_probes_each_once() {
    let bank = bank();
    let (order, _) = probe_order(&bank, "low,high,low", false);
    assert_eq!(order, vec!["low", "high", "mid"]);
}

#[test]
fn test_strict_list_has_no_fallback() {
    let bank = bank();
    let (order, _) = probe_order(&bank, "low", true);
    assert_eq!(order, vec!["low"]);
    let (order, _) = probe_order(&bank, "missing", true);
    assert!(order.is_empty());
}

#[test]
fn test_none_stops_selection() {
    let bank = bank();
    let (order, selected) = probe_order(&bank, "mid,none,high", false);
    assert_eq!(order, vec!["mid"]);
    assert!(selected.is_none());
}

#[test]
fn test_zero_score_module_needs_explicit_name() {
    let bank = bank();
    let mut args = DemuxArgs {
        accept: vec!["off"],
        ..Default::default()
    };
    let ranked = Capability::parse("ranked");
    assert!(bank.select(&ranked, "any", false, &mut args).is_none());
    let selected = bank.select(&ranked, "off", false, &mut args).unwrap();
    assert_eq!(selected.name(), "off");
}

#[test]
fn test_strict_name_is_forced() {
    let bank = bank();
    let mut args = DemuxArgs::default();
    let demux: Capability = CapabilityId::Demux.into();
    assert!(bank.select(&demux, "avi", false, &mut args).is_none());
    let selected = bank.select(&demux, "AVI", true, &mut args).unwrap();
    assert_eq!(selected.name(), "avi");
}

#[test]
fn test_selected_module_releases() {
    let bank = bank();
    let mut args = DemuxArgs {
        accept: vec!["mp4", "avi"],
        ..Default::default()
    };
    let selected = bank
        .select(&CapabilityId::Demux.into(), "", false, &mut args)
        .unwrap();
    assert_eq!(selected.name(), "mp4");
    assert!(bank.release(&selected, &mut args));
    assert_eq!(args.closed, 1);

    let avi = bank.select(&CapabilityId::Demux.into(), "avi", true, &mut args).unwrap();
    assert!(!bank.release(&avi, &mut args));
    assert_eq!(args.closed, 1);
}

#[test]
fn test_selected_module_outlives_bank() {
    let bank = bank();
    let mut args = DemuxArgs {
        accept: vec!["mp4"],
        ..Default::default()
    };
    let selected = bank
        .select(&CapabilityId::Demux.into(), "any", false, &mut args)
        .unwrap();
    drop(bank);
    assert_eq!(selected.name(), "mp4");
    assert_eq!(selected.long_name(), "MP4 demuxer");
}
