// src/server/context.rs

use crate::connection::Handler;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Holds all the initialized state required to run the server's main loop.
pub struct ServerContext {
    pub listener: TcpListener,
    /// The address actually bound, which differs from the configured one for port 0.
    pub local_addr: SocketAddr,
    pub handler: Arc<dyn Handler>,
}
