//! Sysinv - command-line front end
//!
//! Parses indented reports into trees and resolves hardware IDs against the
//! system's `pci.ids`/`usb.ids` catalogs.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use sysinv_core::{parse_indent_tree, FileSource, IdCatalogResolver, ListEnumerator, LocalFiles};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "sysinv")]
#[command(about = "Structured host inventory from semi-structured text")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "sysinv.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse an indented "key: value" report into a tree
    Tree {
        /// Report to parse, e.g. saved system_profiler output
        file: PathBuf,
        /// Print one "path: value" line per leaf instead of JSON
        #[arg(long)]
        flat: bool,
    },
    /// Resolve discovered vendor/device IDs to names
    Resolve {
        /// ID list, one "<pci|usb> <vendor>:<device>" entry per line
        ids: PathBuf,
    },
    /// Print the ID cache file used on this machine
    CachePath,
    /// Write a default configuration file
    InitConfig {
        /// Where to write it
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Sysinv v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Tree { file, flat } => {
            let lines = LocalFiles
                .read_lines(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let tree = parse_indent_tree(lines);

            if flat {
                for (path, value) in tree.leaves() {
                    println!("{}: {}", path.join(" / "), value);
                }
            } else {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            }
        }
        Command::Resolve { ids } => {
            let config = config::load_config(&args.config)?;
            let enumerator = ListEnumerator::from_file(&LocalFiles, &ids)
                .with_context(|| format!("Failed to read {}", ids.display()))?;

            let resolver_config = config.to_resolver_config(&current_hostname());
            info!(
                pci_ids = %resolver_config.pci_ids.display(),
                usb_ids = %resolver_config.usb_ids.display(),
                "Resolving hardware IDs"
            );

            let mut resolver = IdCatalogResolver::local(resolver_config);
            let records = resolver.resolve_from(&enumerator);
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::CachePath => {
            let config = config::load_config(&args.config)?;
            match config.to_resolver_config(&current_hostname()).cache_path {
                Some(path) => println!("{}", path.display()),
                None => println!("caching disabled"),
            }
        }
        Command::InitConfig { path } => {
            config::save_default_config(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}

/// Hostname used to pick this machine's cache file
fn current_hostname() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            warn!(error = %e, "Could not read hostname, using \"localhost\"");
            "localhost".to_string()
        }
    }
}
