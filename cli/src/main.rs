//! Blinken CLI: the terminal entry point for the dashboard.

mod keymap;
mod terminal;
mod theme;

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use blinken_core::config::{parse_overrides, DEFAULT_CONFIG_PATH};
use blinken_core::registry::{PluginRegistry, DEFAULT_PLUGIN_DIR};
use blinken_core::Sys;


#[derive(Parser)]
#[command(name = "blinken")]
#[command(about = "Tiled procedural-content terminal dashboard", long_about = None)]
struct Cli {
    /// Configuration document
    #[arg(long, env = "BLINKEN_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory scanned for plugin manifests
    #[arg(long, default_value = DEFAULT_PLUGIN_DIR)]
    plugin_dir: PathBuf,

    /// Print every registered plugin type and exit
    #[arg(long)]
    list_plugins: bool,

    /// Show a single plugin full screen
    #[arg(long, value_name = "NAME")]
    test_plugin: Option<String>,

    /// Config overrides for --test-plugin, as key=value
    #[arg(long, value_name = "KEY=VALUE", num_args = 1.., requires = "test_plugin")]
    plugin_config: Vec<String>,

    /// Write logs here (the terminal is taken by the dashboard)
    #[arg(long, env = "BLINKEN_LOG")]
    log_file: Option<PathBuf>,
}


fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}


fn run(cli: Cli) -> Result<()> {
    init_logging(cli.log_file.as_deref())?;

    if cli.list_plugins {
        let registry = load_registry(&cli.plugin_dir);
        print!("{}", plugin_listing(&registry));
        return Ok(());
    }

    if let Some(name) = cli.test_plugin {
        let registry = load_registry(&cli.plugin_dir);
        if !registry.contains(&name) {
            tracing::error!(plugin = %name, "test plugin not found");
            return terminal::run_plugin_error(&name, &registry.list());
        }
        let overrides = parse_overrides(cli.plugin_config.as_slice());
        return terminal::run_dashboard(move |width, height| {
            Ok(Sys::single_plugin(&name, overrides, registry, width, height)?)
        });
    }

    let config = cli.config;
    let plugin_dir = cli.plugin_dir;
    tracing::info!(config = %config.display(), plugins = %plugin_dir.display(), "starting");
    terminal::run_dashboard(move |width, height| Ok(Sys::open(&config, &plugin_dir, width, height)))
}


fn load_registry(plugin_dir: &Path) -> PluginRegistry {
    let mut registry = PluginRegistry::with_builtins();
    for err in registry.discover(plugin_dir) {
        tracing::warn!(error = %err, "plugin candidate skipped");
        eprintln!("warning: {}", err);
    }
    registry
}


fn plugin_listing(registry: &PluginRegistry) -> String {
    let mut out = String::from("Available plugins:\n");
    for name in registry.list() {
        out.push_str(&format!("  {}\n", name));
    }
    out.push_str(
        "\n\
Examples:
  blinken --test-plugin TacticalMap
  blinken --test-plugin TacticalMap --plugin-config target_interval=2.0 num_coordinates=5
  blinken --test-plugin HexScroll --plugin-config color_scheme=amber columns=8
",
    );
    out
}


fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
    Ok(())
}
