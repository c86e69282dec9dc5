// src/server/connection_loop.rs

//! Contains the main server loop for accepting connections and handling graceful shutdown.

use super::shutdown::{Shutdown, ShutdownSignal};
use crate::connection::{ConnectionContext, Handler};
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// A source of inbound TCP connections for the accept loop.
#[async_trait]
pub trait Acceptor: Send + Sync + 'static {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)>;
}

#[async_trait]
impl Acceptor for TcpListener {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }
}

/// Accepts connections on `listener` and hands each one to `handler` in its own
/// task until `signal` fires or the listener fails.
///
/// Returns only after the handler has been closed and every connection task
/// has finished.
pub async fn listen_and_serve<L, H>(listener: L, handler: Arc<H>, mut signal: ShutdownSignal)
where
    L: Acceptor,
    H: Handler + ?Sized,
{
    let shutdown = Arc::new(Shutdown::new(handler.clone()));
    let stop_accepting = shutdown.token();

    let watcher = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            signal.recv().await;
            info!("Shutdown requested.");
            shutdown.shutdown().await;
        })
    };

    let mut client_tasks = JoinSet::new();

    loop {
        tokio::select! {
            biased;

            _ = stop_accepting.cancelled() => {
                break;
            }

            res = listener.accept() => {
                match res {
                    Ok((socket, addr)) => {
                        info!("Accepted new connection from: {}", addr);
                        let ctx = ConnectionContext::new(addr, stop_accepting.clone());
                        let handler = handler.clone();
                        client_tasks.spawn(async move {
                            handler.serve(ctx, socket).await;
                        });
                    }
                    Err(e) if is_transient_accept_error(&e) => {
                        warn!("Failed to accept connection: {}", e);
                    }
                    Err(e) => {
                        error!("Listener failed, shutting down: {}", e);
                        break;
                    }
                }
            }

            Some(res) = client_tasks.join_next() => {
                if let Err(e) = res
                    && e.is_panic()
                {
                    error!("A client handler panicked: {e:?}");
                }
            }
        }
    }

    // The listener is closed here on both exit paths; the socket is released once.
    drop(listener);
    shutdown.shutdown().await;

    info!(
        "Waiting for {} client connection(s) to finish.",
        client_tasks.len()
    );
    while let Some(res) = client_tasks.join_next().await {
        if let Err(e) = res
            && e.is_panic()
        {
            error!("A client handler panicked: {e:?}");
        }
    }
    info!("All client connections closed.");

    watcher.abort();
    debug!("Server shutdown complete.");
}

/// Errors that concern a single pending connection rather than the listener.
/// The accept loop logs these and keeps going; any other error stops it.
pub fn is_transient_accept_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}
