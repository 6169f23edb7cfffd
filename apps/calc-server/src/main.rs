#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod server;

use std::path::PathBuf;

use anyhow::{Context, Result};
use calc_bootstrap::{AppConfig, cancel_on_shutdown, ensure_dir, init_logging};
use calculator::{CalculatorConfig, CalculatorModule};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Calcspot Server - arithmetic over HTTP with per-session history
#[derive(Parser)]
#[command(name = "calc-server")]
#[command(about = "Calcspot Server - arithmetic over HTTP with per-session history")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env -> 4) CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.port, cli.verbose);

    if cli.print_config {
        println!("Effective configuration:\n{}", config.to_yaml()?);
        return Ok(());
    }

    init_logging(&config.logging, config.debug)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    server::parse_bind_address(&config.server.bind_addr)?;
    let _: CalculatorConfig = config.module_config_or_default(CalculatorModule::NAME)?;
    println!("Configuration is valid");
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Calcspot Server starting");

    let calc_cfg: CalculatorConfig = config.module_config_or_default(CalculatorModule::NAME)?;
    let data_dir = ensure_dir(&calc_cfg.data_dir)
        .with_context(|| format!("preparing data dir '{}'", calc_cfg.data_dir))?;
    let module = CalculatorModule::init(&calc_cfg, &data_dir)?;

    let router = server::build_router(&config.server, &module);
    let addr = server::parse_bind_address(&config.server.bind_addr)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(addr = %listener.local_addr()?, "HTTP server bound");

    let cancel = CancellationToken::new();
    let signals = cancel_on_shutdown(cancel.clone());

    server::serve(listener, router, cancel.clone()).await?;
    cancel.cancel();
    signals.await?;
    tracing::info!("Calcspot Server stopped");
    Ok(())
}
