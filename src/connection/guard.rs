// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection registration.

use super::registry::ConnectionRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// An RAII guard that removes a connection from the registry when the worker
/// serving it exits, whatever the exit path.
pub struct ConnectionGuard {
    /// The registry the connection was stored in.
    pub(crate) registry: Arc<ConnectionRegistry>,
    /// The unique identifier for the client session.
    pub(crate) session_id: u64,
    /// The network address of the client.
    pub(crate) addr: SocketAddr,
}

impl ConnectionGuard {
    /// Creates a new `ConnectionGuard`.
    pub(crate) fn new(registry: Arc<ConnectionRegistry>, session_id: u64, addr: SocketAddr) -> Self {
        Self {
            registry,
            session_id,
            addr,
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        debug!(
            "ConnectionGuard dropping, deregistering connection {}",
            self.addr
        );

        if !self.registry.delete(self.session_id) {
            debug!(
                "Client {} was not in the registry upon cleanup.",
                self.addr
            );
        }
    }
}
