//! The built-in "core" plugin.
//!
//! It carries the host's own options, including the three that drive plugin
//! discovery. It is always registered first, so that discovery can read
//! them.

use modbank_core::{CapabilityId, StringKind};
use modbank_plugin_api::{describe_with, DescribeError, Descriptor, PluginBuilder};

/// Option enabling the plugin cache.
pub const OPT_PLUGINS_CACHE: &str = "plugins-cache";
/// Option enabling directory scans.
pub const OPT_PLUGINS_SCAN: &str = "plugins-scan";
/// Option rebuilding the plugin cache.
pub const OPT_RESET_PLUGINS_CACHE: &str = "reset-plugins-cache";
/// Verbosity option.
pub const OPT_VERBOSE: &str = "verbose";

fn describe(b: &mut PluginBuilder<'_>) -> Result<(), DescribeError> {
    b.module("core")?
        .shortname("Core")?
        .description("Core program")?;

    b.category("Advanced")?;
    b.section("Plugins", None)?;
    b.add_bool(
        OPT_PLUGINS_CACHE,
        true,
        "Use a plugins cache",
        Some("Use a plugins cache which will greatly improve the startup time."),
    )?;
    b.add_bool(
        OPT_PLUGINS_SCAN,
        true,
        "Scan for new plugins",
        Some("Scan plugin directories for new plugins at startup."),
    )?;
    b.add_bool(
        OPT_RESET_PLUGINS_CACHE,
        false,
        "Reset the plugins cache",
        Some("Rebuild the plugins cache from a fresh directory scan."),
    )?
    .change_volatile()?;

    b.section("Messages", None)?;
    b.add_integer_with_range(
        OPT_VERBOSE,
        0,
        -1,
        2,
        "Verbosity (0,1,2)",
        Some("Verbosity of log messages: 0 for errors, 1 for warnings, 2 for debug."),
    )?
    .change_short('v')?
    .change_integer_list(&[-1, 0, 1, 2], &["Quiet", "Errors", "Warnings", "Debug"])?;

    b.category("Input / Codecs")?;
    b.add_module(
        "access",
        CapabilityId::Access.as_str(),
        None,
        "Access module",
        Some("Default access module."),
    )?;
    b.add_module(
        "demux",
        CapabilityId::Demux.as_str(),
        None,
        "Demux module",
        Some("Default demultiplexer."),
    )?
    .change_safe()?;
    b.add_module_list(
        "codec",
        CapabilityId::VideoDecoder.as_str(),
        None,
        "Preferred decoders list",
        Some("Decoders to try first, comma-separated."),
    )?
    .change_safe()?;
    b.add_string_kind(
        StringKind::Directory,
        "plugin-dir",
        None,
        "Extra plugin directory",
        None,
    )?
    .change_private()?;
    Ok(())
}

/// Entry point of the core plugin.
pub fn entry(descriptor: &mut dyn Descriptor) -> Result<(), DescribeError> {
    describe_with(descriptor, describe)
}
