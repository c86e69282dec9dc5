// src/main.rs

//! The main entry point for the SpinelNet server application.

use anyhow::Result;
use spinelnet::config::{Config, Protocol};
use spinelnet::server;
use std::env;
use std::path::Path;
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    run_app().await
}

async fn run_app() -> Result<()> {
    // Define version information.
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    // Collect command-line arguments to decide the execution mode.
    let args: Vec<String> = env::args().collect();

    // Handle the --version flag.
    if args.contains(&"--version".to_string()) {
        println!("SpinelNet version {VERSION}");
        return Ok(());
    }

    // Determine the configuration path.
    // It can be provided via a --config flag; otherwise, it defaults to "config.toml".
    let explicit_path = flag_value(&args, "--config");
    let config_path = explicit_path.unwrap_or(DEFAULT_CONFIG_PATH);

    // An explicitly requested file must load. The default file is optional.
    let mut config = if explicit_path.is_some() || Path::new(config_path).exists() {
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load configuration from \"{config_path}\": {e:#}");
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Command-line overrides.
    if let Some(port_str) = flag_value(&args, "--port") {
        match port_str.parse::<u16>() {
            Ok(port) => config.port = port,
            Err(_) => {
                eprintln!("Invalid port number: {port_str}");
                std::process::exit(1);
            }
        }
    }
    if let Some(host) = flag_value(&args, "--host") {
        config.host = host.to_string();
    }
    if let Some(protocol_str) = flag_value(&args, "--protocol") {
        match Protocol::from_str(protocol_str) {
            Ok(protocol) => config.protocol = protocol,
            Err(_) => {
                eprintln!("Unknown protocol: {protocol_str} (expected 'echo' or 'ping')");
                std::process::exit(1);
            }
        }
    }
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Setup logging. Get the level from the env var or the config.
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .compact() // Use the compact, single-line format.
        .with_ansi(true) // Enable ANSI color codes for log levels.
        .init();

    if let Err(e) = server::run(config).await {
        error!("Server runtime error: {:#}", e);
        return Err(e);
    }

    Ok(())
}

/// Returns the value following `flag`, exiting if the flag has none.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let index = args.iter().position(|arg| arg == flag)?;
    match args.get(index + 1) {
        Some(value) => Some(value.as_str()),
        None => {
            eprintln!("{flag} flag requires a value");
            std::process::exit(1);
        }
    }
}
