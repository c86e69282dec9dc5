// src/connection/client.rs

//! Defines `ClientHandle`, the shared handle to one accepted client connection.

use crate::core::SpinelNetError;
use crate::core::sync::Wait;
use async_trait::async_trait;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Session ids are unique for the lifetime of the process and never reused,
/// so two handles never compare equal even if their peer addresses do.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// The write side of a client stream.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// What the connection layer exposes to protocol processors.
#[async_trait]
pub trait Connection: Send + Sync {
    /// The unique identifier of this client session.
    fn session_id(&self) -> u64;

    /// The network address of the peer.
    fn peer_addr(&self) -> SocketAddr;

    /// Writes a complete reply to the peer.
    async fn write(&self, bytes: &[u8]) -> Result<(), SpinelNetError>;

    /// The logical database currently selected by this client.
    fn db_index(&self) -> usize;

    /// Switches the logical database. Range checks belong to the protocol layer.
    fn select_db(&self, index: usize);
}

/// One accepted client connection, shared between its worker, the registry and
/// the shutdown path.
///
/// The worker exclusively owns the read half of the stream; the write half lives
/// here so replies and forced closure can reach it from any task.
pub struct ClientHandle {
    session_id: u64,
    addr: SocketAddr,
    created: Instant,
    writer: Mutex<Option<BoxedWriter>>,
    waiting: Wait,
    db_index: AtomicUsize,
    kill: CancellationToken,
}

impl ClientHandle {
    /// Creates a handle for a freshly accepted connection.
    pub fn new(addr: SocketAddr, writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            session_id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            addr,
            created: Instant::now(),
            writer: Mutex::new(Some(Box::new(writer))),
            waiting: Wait::new(),
            db_index: AtomicUsize::new(0),
            kill: CancellationToken::new(),
        }
    }

    /// The in-flight operation counter for this connection.
    pub fn waiting(&self) -> &Wait {
        &self.waiting
    }

    /// Returns true once the connection has been force-closed.
    pub fn is_killed(&self) -> bool {
        self.kill.is_cancelled()
    }

    /// Completes when the connection is force-closed.
    pub async fn killed(&self) {
        self.kill.cancelled().await
    }

    /// Force-closes the connection immediately, without waiting for in-flight work.
    pub fn kill(&self) {
        self.kill.cancel();
    }

    /// Gives in-flight operations up to `grace` to finish, then force-closes
    /// the connection whether or not they did. Safe to call more than once.
    pub async fn close(&self, grace: Duration) {
        if self.waiting.wait_with_timeout(grace).await.is_timed_out() {
            warn!(
                "Connection {} still had {} operation(s) in flight after {:?}; closing anyway.",
                self.addr,
                self.waiting.count(),
                grace
            );
        }
        debug!(
            "Force-closing connection {} (session {}, open for {:?}).",
            self.addr,
            self.session_id,
            self.created.elapsed()
        );
        self.kill();
        self.shutdown_writer().await;
    }

    /// Shuts the write half down and releases it. Later writes fail with
    /// `ConnectionClosed`.
    pub async fn shutdown_writer(&self) {
        if let Some(mut writer) = self.writer.lock().await.take() {
            // The peer may already be gone; closing twice is not an error here.
            if let Err(e) = writer.shutdown().await {
                debug!("Error shutting down writer for {}: {}", self.addr, e);
            }
        }
    }
}

#[async_trait]
impl Connection for ClientHandle {
    fn session_id(&self) -> u64 {
        self.session_id
    }

    fn peer_addr(&self) -> SocketAddr {
        self.addr
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), SpinelNetError> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(SpinelNetError::ConnectionClosed)?;
        writer.write_all(bytes).await?;
        writer.flush().await?;
        Ok(())
    }

    fn db_index(&self) -> usize {
        self.db_index.load(Ordering::Relaxed)
    }

    fn select_db(&self, index: usize) {
        self.db_index.store(index, Ordering::Relaxed);
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("session_id", &self.session_id)
            .field("addr", &self.addr)
            .field("age", &self.created.elapsed())
            .field("in_flight", &self.waiting.count())
            .field("db_index", &self.db_index())
            .field("killed", &self.is_killed())
            .finish()
    }
}
