use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use log::info;
use std::fs;
use std::path::PathBuf;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;
use gluecodec::catalog::{Catalog, CatalogService};
use gluecodec::codec::{Encode, Value, decode_value};
use gluecodec::ipc::GlueServer;

fn setup_logging(level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gluecodec")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("gluecodec.log");

    // stdout carries protocol frames, so logs always go to the file
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let env = env_logger::Env::default().default_filter_or(level.unwrap_or("info"));
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        eprintln!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Check { text } => handle_check_command(text),
        Commands::EncodeValue { json } => handle_encode_value_command(json),
        Commands::Serve { catalog } => handle_serve_command(catalog.as_ref(), config),
    }
}

fn handle_check_command(text: &str) -> Result<()> {
    info!("Checking value text: {:?}", text);
    let value = decode_value(text).context("Value text did not parse")?;
    let json = serde_json::to_string_pretty(&value).context("Failed to render value as JSON")?;
    eprintln!("{} {:?}", "Valid:".green(), value.glue_type());
    println!("{}", json);
    Ok(())
}

fn handle_encode_value_command(json: &str) -> Result<()> {
    info!("Encoding JSON value: {}", json);
    let value: Value = serde_json::from_str(json).context("Failed to parse JSON value")?;
    println!("{}", value.encode());
    Ok(())
}

fn handle_serve_command(catalog: Option<&PathBuf>, config: &Config) -> Result<()> {
    let Some(path) = catalog.or(config.catalog.as_ref()) else {
        bail!("No catalog given: pass --catalog or set `catalog` in the config file");
    };
    let catalog = Catalog::load(path).context(format!("Failed to load catalog from {}", path.display()))?;
    info!("Serving catalog {} on stdio", path.display());
    eprintln!("{} {}", "Serving:".green(), path.display());

    let server = GlueServer::with_config(config.server.to_server_config());
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let stats = runtime
        .block_on(server.serve(
            CatalogService::new(catalog),
            tokio::io::stdin(),
            tokio::io::stdout(),
        ))
        .context("Glue session failed")?;

    eprintln!(
        "{} {} requests, {} parse errors, {} events",
        "Done:".green(),
        stats.requests,
        stats.parse_errors,
        stats.events
    );
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging with the configured default level
    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
