// src/connection/registry.rs

//! The set of currently open client connections.

use super::client::{ClientHandle, Connection};
use dashmap::DashMap;
use std::sync::Arc;

/// A concurrent set of live connections, keyed by session id.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    clients: DashMap<u64, Arc<ClientHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, client: Arc<ClientHandle>) {
        self.clients.insert(client.session_id(), client);
    }

    /// Removes a connection. Deleting an absent session is a no-op; the return
    /// value tells whether an entry was actually removed.
    pub fn delete(&self, session_id: u64) -> bool {
        self.clients.remove(&session_id).is_some()
    }

    pub fn contains(&self, session_id: u64) -> bool {
        self.clients.contains_key(&session_id)
    }

    pub fn get(&self, session_id: u64) -> Option<Arc<ClientHandle>> {
        self.clients
            .get(&session_id)
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Returns the connections registered at the time of the call.
    pub fn snapshot(&self) -> Vec<Arc<ClientHandle>> {
        self.clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Calls `visit` for every connection in a snapshot taken at call time.
    ///
    /// No shard lock is held while `visit` runs, so it may store into or delete
    /// from this registry. Entries added after the snapshot are not visited.
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(&Arc<ClientHandle>),
    {
        for client in self.snapshot() {
            visit(&client);
        }
    }
}
