//! Command-line inspector for a plugin bank.
//!
//! # Usage
//!
//! List the modules of one capability, best first:
//! ```bash
//! modbank --plugin-path /usr/lib/modbank modules --capability demux
//! ```
//!
//! Rebuild the plugin cache and print counts:
//! ```bash
//! MODBANK_RESET_CACHE=true modbank --plugin-path /usr/lib/modbank stats
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use modbank::logging::{self, TracingConfig};
use modbank::modbank_core::{ConfigItem, ConfigRegistry, ItemClass};
use modbank::{Bank, BankSettings, Capability, RuntimeRegistry};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "modbank")]
#[command(about = "Inspect plugins, modules and options of a plugin bank", long_about = None)]
struct Cli {
    /// Settings file (TOML format)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Extra plugin directory, may be repeated
    #[arg(long = "plugin-path")]
    plugin_paths: Vec<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List modules, optionally only those of one capability
    Modules {
        /// Capability name, e.g. "demux" or a custom one
        #[arg(long)]
        capability: Option<String>,
    },

    /// Show configuration items and their current values
    Config {
        /// Only this item
        name: Option<String>,
    },

    /// Show the suggested values of a configuration item
    Choices {
        /// Item name
        name: String,
    },

    /// Print bank counts
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => BankSettings::load_from(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => BankSettings::load().context("loading settings")?,
    };
    settings.plugin_paths.extend(cli.plugin_paths.iter().cloned());
    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }
    settings.validate().map_err(|e| anyhow!(e))?;

    let tracing = TracingConfig::from_settings(&settings).map_err(|e| anyhow!(e))?;
    logging::init(tracing).map_err(|e| anyhow!(e))?;

    let runtime = RuntimeRegistry::new(settings);
    let bank = runtime.acquire()?;

    match cli.command {
        Commands::Modules { capability } => print_modules(&bank, capability.as_deref()),
        Commands::Config { name } => print_config(bank.config(), name.as_deref())?,
        Commands::Choices { name } => print_choices(&bank, &name)?,
        Commands::Stats => {
            let stats = bank.stats();
            println!("plugins:        {}", stats.plugins);
            println!("modules:        {}", stats.modules);
            println!("listed modules: {}", stats.listed_modules);
            println!("options:        {}", stats.config_items);
            println!("option table:   {}", stats.option_table_size());
        }
    }
    Ok(())
}

fn print_modules(bank: &Bank, capability: Option<&str>) {
    let modules = match capability {
        Some(name) => bank.list(&Capability::parse(name)).to_vec(),
        None => bank.modules(),
    };
    for module in modules {
        println!(
            "{:<24} {:<20} {:>5}  {}",
            module.name(),
            module.capability,
            module.score,
            module.long_name()
        );
    }
}

fn print_config(config: &ConfigRegistry, name: Option<&str>) -> Result<()> {
    let items: Vec<_> = match name {
        Some(name) => vec![config
            .find(name)
            .ok_or_else(|| anyhow!("no option named '{}'", name))?],
        None => config.items().filter(|item| item.name.is_some()).collect(),
    };
    for item in items {
        println!("{:<28} {}", item.name_str(), format_value(config, item)?);
    }
    Ok(())
}

fn format_value(config: &ConfigRegistry, item: &ConfigItem) -> Result<String> {
    let name = item.name_str();
    let value = match item.class() {
        ItemClass::Special => String::from("-"),
        ItemClass::Bool => config.get_bool(name)?.to_string(),
        ItemClass::Integer => config.get_int(name)?.to_string(),
        ItemClass::Float => config.get_float(name)?.to_string(),
        ItemClass::String => config.get_string(name)?.unwrap_or_default(),
    };
    Ok(value)
}

fn print_choices(bank: &Bank, name: &str) -> Result<()> {
    let item = bank
        .config()
        .find(name)
        .ok_or_else(|| anyhow!("no option named '{}'", name))?;
    match item.class() {
        ItemClass::String => {
            for (value, text) in bank.string_choices(name)? {
                println!("{:<24} {}", value, text);
            }
        }
        ItemClass::Integer => {
            for (value, text) in bank.int_choices(name)? {
                println!("{:>6}  {}", value, text);
            }
        }
        class => return Err(anyhow!("'{}' is a {} option", name, class.label())),
    }
    Ok(())
}
