//! Shared fixtures: demo plugins and an opener serving them by file name.

#![allow(dead_code)]

use modbank::bank::loader::plugin_suffix;
use modbank::bank::{LibraryOpener, LoadMode, PluginLibrary};
use modbank::modbank_plugin_api::prelude::*;
use modbank::modbank_plugin_api::PluginEntry;
use modbank::MapError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Arguments of demux activation callbacks.
#[derive(Debug, Default)]
pub struct DemuxArgs {
    pub probed: Vec<String>,
    pub accept: Vec<&'static str>,
    pub closed: usize,
}

fn open_demux(args: &mut DemuxArgs, info: &ProbeInfo<'_>) -> ProbeStatus {
    args.probed.push(info.module.to_string());
    if info.forced || args.accept.iter().any(|m| *m == info.module) {
        ProbeStatus::Accepted
    } else {
        ProbeStatus::Declined
    }
}

fn close_demux(args: &mut DemuxArgs) {
    args.closed += 1;
}

fn describe_mp4(b: &mut PluginBuilder<'_>) -> Result<(), DescribeError> {
    b.module("mp4")?
        .description("MP4 demuxer")?
        .capability(CapabilityId::Demux, 240)?
        .callbacks::<DemuxArgs>("open_demux", open_demux, "close_demux", close_demux)?;
    b.add_bool("mp4-fragmented", false, "Fragmented files", None)?;
    Ok(())
}

fn describe_avi(b: &mut PluginBuilder<'_>) -> Result<(), DescribeError> {
    b.module("avi")?
        .description("AVI demuxer")?
        .capability(CapabilityId::Demux, 212)?
        .activate::<DemuxArgs>("open_demux", open_demux)?;
    b.add_integer_with_range("avi-index", 0, 0, 2, "Index repair", None)?
        .change_integer_list(&[0, 1, 2], &["Ask", "Always", "Never"])?;
    Ok(())
}

fn describe_ranked(b: &mut PluginBuilder<'_>) -> Result<(), DescribeError> {
    for (name, score) in [("low", 1), ("high", 20), ("mid", 5), ("off", 0)] {
        b.module(name)?
            .capability_named("ranked", score)?
            .activate::<DemuxArgs>("open_demux", open_demux)?;
    }
    Ok(())
}

pub fn mp4(d: &mut dyn Descriptor) -> Result<(), DescribeError> {
    modbank::modbank_plugin_api::describe_with(d, describe_mp4)
}

pub fn avi(d: &mut dyn Descriptor) -> Result<(), DescribeError> {
    modbank::modbank_plugin_api::describe_with(d, describe_avi)
}

pub fn ranked(d: &mut dyn Descriptor) -> Result<(), DescribeError> {
    modbank::modbank_plugin_api::describe_with(d, describe_ranked)
}

/// Opener resolving `<stem>_plugin.<ext>` to a registered entry point.
#[derive(Default)]
pub struct FakeOpener {
    entries: HashMap<String, PluginEntry>,
    opens: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeOpener {
    pub fn new() -> Self {
        Self::default()
            .with("mp4", mp4)
            .with("avi", avi)
            .with("ranked", ranked)
    }

    pub fn with(mut self, stem: &str, entry: PluginEntry) -> Self {
        self.entries.insert(stem.to_string(), entry);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.opens.store(0, Ordering::SeqCst);
    }
}

struct FakeLibrary(PluginEntry);

impl PluginLibrary for FakeLibrary {
    fn entry(&self) -> Result<PluginEntry, MapError> {
        Ok(self.0)
    }
}

impl LibraryOpener for FakeOpener {
    fn open(&self, path: &Path, _mode: LoadMode) -> Result<Box<dyn PluginLibrary>, MapError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let stem = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(plugin_suffix()))
            .unwrap_or_default();
        match self.entries.get(stem) {
            Some(entry) => Ok(Box::new(FakeLibrary(*entry))),
            None => Err(MapError::Open {
                path: path.to_path_buf(),
                reason: "no such plugin".into(),
            }),
        }
    }
}

/// Create an empty plugin file named after `stem`.
pub fn touch_plugin(dir: &Path, stem: &str) -> PathBuf {
    let path = dir.join(format!("{}{}", stem, plugin_suffix()));
    std::fs::write(&path, b"plugin").unwrap();
    path
}

pub fn opener() -> Arc<FakeOpener> {
    Arc::new(FakeOpener::new())
}
