// src/server/mod.rs

use crate::config::Config;
use anyhow::{Context, Result};

mod connection_loop;
mod context;
mod initialization;
mod shutdown;
mod signal;

pub use connection_loop::{Acceptor, is_transient_accept_error, listen_and_serve};
pub use context::ServerContext;
pub use initialization::{build_handler, setup};
pub use shutdown::{ShutdownSignal, ShutdownTrigger, channel as shutdown_channel};
pub use signal::spawn_signal_bridge;

/// The main server startup function: bind, install the signal bridge, and
/// serve until a termination signal arrives and every connection has closed.
pub async fn run(config: Config) -> Result<()> {
    // 1. Bind the listener and build the handler. Bind errors surface here.
    let server_context = initialization::setup(&config).await?;

    // 2. Route termination signals to the shutdown trigger.
    let (trigger, signal) = shutdown::channel();
    let bridge =
        signal::spawn_signal_bridge(trigger).context("Failed to register signal handlers")?;

    // 3. Start the main connection acceptance loop. This function will run until shutdown.
    connection_loop::listen_and_serve(server_context.listener, server_context.handler, signal)
        .await;

    bridge.abort();
    Ok(())
}
