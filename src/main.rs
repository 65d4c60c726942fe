//! findmy-bridge CLI
//!
//! Entry point for the `findmy-bridge` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use findmy_bridge::config::{default_host_config_path, BridgeSettings, EffectiveConfig};
use findmy_bridge::findmy::{detect_format, DeviceCacheReader, SnapshotKind};
use findmy_bridge::platform::Platform;
use findmy_bridge::{Bridge, BridgeResult};

#[derive(Parser)]
#[command(name = "findmy-bridge")]
#[command(about = "Find My locations and private Contacts over a local HTTP API", version)]
struct Cli {
    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Path to config file (default: ~/.config/findmy-bridge/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and the Private API listener
    Serve {
        /// HTTP listen address, e.g. 127.0.0.1:1234
        #[arg(long)]
        listen: Option<String>,

        /// Private API helper port
        #[arg(long)]
        port: Option<u16>,

        /// Enable the Private API helper
        #[arg(long)]
        enable_private_api: bool,

        /// Enable the Contacts Private API routes
        #[arg(long)]
        enable_contacts: bool,
    },

    /// Print devices read from the Find My cache
    Devices {
        /// Find My cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Report the on-disk format of each Find My cache file
    InspectCache {
        /// Find My cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> BridgeResult<()> {
    let overrides = cli_overrides(&cli.command);
    let host_path = cli.config.clone().or_else(default_host_config_path);
    let effective = EffectiveConfig::build(host_path.as_deref(), overrides)?;
    for key in &effective.unknown_keys {
        warn!(key = %key, "Ignoring unknown config key");
    }

    match cli.command {
        Commands::Config => {
            println!("{}", effective.to_json()?);
            Ok(())
        }
        Commands::Serve { .. } => {
            let settings = BridgeSettings::from_effective(&effective)?;
            runtime()?.block_on(Bridge::new(settings, Platform::detect()).run())
        }
        Commands::Devices { json, .. } => {
            let settings = BridgeSettings::from_effective(&effective)?;
            let reader = DeviceCacheReader::new(&settings.findmy_cache_dir);
            let devices = runtime()?.block_on(reader.get_devices());
            print_devices(devices, json)
        }
        Commands::InspectCache { json, .. } => {
            let settings = BridgeSettings::from_effective(&effective)?;
            inspect_cache(&DeviceCacheReader::new(&settings.findmy_cache_dir), json)
        }
    }
}

fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread().enable_all().build()
}

/// Translate CLI flags into a config layer.
fn cli_overrides(command: &Commands) -> Option<Value> {
    let mut layer = Map::new();
    let mut set = |section: &str, key: &str, value: Value| {
        let entry = layer
            .entry(section.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(map) = entry {
            map.insert(key.to_string(), value);
        }
    };

    match command {
        Commands::Serve {
            listen,
            port,
            enable_private_api,
            enable_contacts,
        } => {
            if let Some(listen) = listen {
                set("http", "listen_addr", json!(listen));
            }
            if let Some(port) = port {
                set("private_api", "port", json!(port));
            }
            if *enable_private_api {
                set("private_api", "enabled", json!(true));
            }
            if *enable_contacts {
                set("contacts", "private_api_enabled", json!(true));
            }
        }
        Commands::Devices { cache_dir, .. } | Commands::InspectCache { cache_dir, .. } => {
            if let Some(dir) = cache_dir {
                set("findmy", "cache_dir", json!(dir.to_string_lossy()));
            }
        }
        Commands::Config => {}
    }

    if layer.is_empty() {
        None
    } else {
        Some(Value::Object(layer))
    }
}

fn print_devices(devices: Option<Vec<Value>>, json_output: bool) -> BridgeResult<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    let Some(devices) = devices else {
        println!("No Find My cache data available.");
        return Ok(());
    };
    if devices.is_empty() {
        println!("No devices found.");
        return Ok(());
    }

    println!("{:<40} {:<24} {}", "NAME", "MODEL", "ID");
    for device in &devices {
        let text = |key: &str| device.get(key).and_then(Value::as_str).unwrap_or("-").to_string();
        println!("{:<40} {:<24} {}", text("name"), text("modelDisplayName"), text("id"));
    }
    Ok(())
}

fn inspect_cache(reader: &DeviceCacheReader, json_output: bool) -> BridgeResult<()> {
    let report: Vec<(SnapshotKind, &'static str)> = SnapshotKind::ALL
        .iter()
        .map(|kind| (*kind, detect_format(&reader.path_for(*kind)).as_str()))
        .collect();

    if json_output {
        let object: Map<String, Value> = report
            .iter()
            .map(|(kind, format)| (kind.file_name().to_string(), json!(format)))
            .collect();
        let output = json!({
            "cache_dir": reader.dir().to_string_lossy(),
            "files": object,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Find My cache: {}", reader.dir().display());
        for (kind, format) in report {
            println!("  {:<16} {}", kind.file_name(), format);
        }
    }
    Ok(())
}
