// src/server/initialization.rs

//! Handles server initialization: binding the listener and building the
//! protocol handler selected by the configuration.

use super::context::ServerContext;
use crate::config::{Config, Protocol};
use crate::connection::{EchoHandler, Handler, LineHandler, Ping};
use crate::core::SpinelNetError;
use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Binds the listener and builds the handler. A bind failure is returned
/// before any connection can be accepted.
pub async fn setup(config: &Config) -> Result<ServerContext> {
    log_startup_info(config);

    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| SpinelNetError::Bind {
            addr: addr.clone(),
            source: Arc::new(e),
        })?;
    let local_addr = listener.local_addr()?;
    info!("SpinelNet server listening on {}", local_addr);

    Ok(ServerContext {
        listener,
        local_addr,
        handler: build_handler(config),
    })
}

/// Builds the handler for the configured protocol.
pub fn build_handler(config: &Config) -> Arc<dyn Handler> {
    match config.protocol {
        Protocol::Echo => Arc::new(EchoHandler::default()),
        Protocol::Ping => Arc::new(LineHandler::new(Ping::new(config.databases))),
    }
}

/// Logs key configuration parameters at startup.
fn log_startup_info(config: &Config) {
    info!("Server configured with protocol '{}'.", config.protocol);
    if config.protocol == Protocol::Ping {
        info!("Server configured with {} databases.", config.databases);
    }
}
