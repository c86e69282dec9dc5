// src/server/shutdown.rs

//! The one-shot shutdown trigger and the idempotent shutdown routine it drives.

use crate::connection::Handler;
use crate::core::sync::AtomicFlag;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Creates a connected trigger/signal pair.
pub fn channel() -> (ShutdownTrigger, ShutdownSignal) {
    // A single slot is enough: a pending trigger already means "shut down".
    let (tx, rx) = mpsc::channel(1);
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

/// The sending side, held by the signal bridge and by any caller that wants to
/// stop the server. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: mpsc::Sender<()>,
}

impl ShutdownTrigger {
    /// Requests shutdown. Never blocks; repeated requests coalesce into one.
    /// Returns `false` if the server side is already gone.
    pub fn trigger(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Closed(())) => {
                debug!("Shutdown requested but the server is no longer listening for it.");
                false
            }
        }
    }
}

/// The receiving side, consumed by the server's watcher task.
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: mpsc::Receiver<()>,
}

impl ShutdownSignal {
    /// Completes once shutdown has been requested. If every trigger is dropped
    /// without firing, this never completes.
    pub async fn recv(&mut self) {
        if self.rx.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

/// The single place where the listener stops and the handler is closed.
/// Reached both from the watcher task and from the accept loop; only the first
/// call has any effect.
pub(crate) struct Shutdown<H: ?Sized> {
    fired: AtomicFlag,
    stop_accepting: CancellationToken,
    handler_closed: CancellationToken,
    handler: Arc<H>,
}

impl<H: Handler + ?Sized> Shutdown<H> {
    pub(crate) fn new(handler: Arc<H>) -> Self {
        Self {
            fired: AtomicFlag::new(false),
            stop_accepting: CancellationToken::new(),
            handler_closed: CancellationToken::new(),
            handler,
        }
    }

    /// Cancelled when the listener must stop accepting.
    pub(crate) fn token(&self) -> CancellationToken {
        self.stop_accepting.clone()
    }

    /// Every caller returns only once the handler has been closed.
    pub(crate) async fn shutdown(&self) {
        if !self.fired.set_once() {
            self.handler_closed.cancelled().await;
            return;
        }
        // Released even if `close` panics, so no other caller waits forever.
        let _closed = self.handler_closed.clone().drop_guard();
        info!("Shutting down. Closing listener and handler.");
        self.stop_accepting.cancel();
        if let Err(e) = self.handler.close().await {
            error!("Handler failed to close cleanly: {}", e);
        }
    }
}
