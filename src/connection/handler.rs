// src/connection/handler.rs

//! Defines the `Handler` contract and `LineHandler`, which manages the full
//! lifecycle of a client connection around a pluggable `LineProcessor`.

use super::client::{ClientHandle, Connection};
use super::guard::ConnectionGuard;
use super::processors::{Echo, LineProcessor};
use super::registry::ConnectionRegistry;
use crate::core::SpinelNetError;
use crate::core::protocol::LineCodec;
use crate::core::sync::AtomicFlag;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long a connection may keep working on in-flight requests once the
/// handler is closed, before its stream is closed regardless.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Per-connection information handed to `Handler::serve` by the accept loop.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub peer_addr: SocketAddr,
    pub accepted_at: Instant,
    /// Shared by every connection of one server; cancelled when it starts shutting down.
    pub shutdown: CancellationToken,
}

impl ConnectionContext {
    pub fn new(peer_addr: SocketAddr, shutdown: CancellationToken) -> Self {
        Self {
            peer_addr,
            accepted_at: Instant::now(),
            shutdown,
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

/// What the server requires from a protocol implementation.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Serves one connection until the peer disconnects, an error occurs, or
    /// the connection is force-closed.
    async fn serve(&self, ctx: ConnectionContext, stream: TcpStream);

    /// Stops accepting work and force-closes every open connection. Called
    /// once by the server; does not wait for the connections to finish.
    async fn close(&self) -> Result<(), SpinelNetError>;
}

/// A handler reading newline-terminated units and answering each through a
/// `LineProcessor`.
pub struct LineHandler<P> {
    processor: P,
    registry: Arc<ConnectionRegistry>,
    closing: AtomicFlag,
}

/// The placeholder protocol: every line is written straight back.
pub type EchoHandler = LineHandler<Echo>;

impl<P: LineProcessor + Default> Default for LineHandler<P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

impl<P: LineProcessor> LineHandler<P> {
    pub fn new(processor: P) -> Self {
        Self {
            processor,
            registry: Arc::new(ConnectionRegistry::new()),
            closing: AtomicFlag::new(false),
        }
    }

    /// The connections currently being served.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn is_closing(&self) -> bool {
        self.closing.get()
    }

    /// Runs one unit through the processor and writes the reply. The unit is
    /// counted as in flight until this returns or is cancelled.
    async fn process_unit(&self, client: &ClientHandle, unit: Bytes) -> Result<(), SpinelNetError> {
        let _in_flight = client.waiting().guard();
        let reply = self.processor.process(client, unit).await?;
        if !reply.is_empty() {
            client.write(&reply).await?;
        }
        Ok(())
    }

    /// The read loop for a registered connection.
    async fn run(&self, client: &ClientHandle, mut frames: FramedRead<OwnedReadHalf, LineCodec>) {
        let addr = client.peer_addr();
        loop {
            let next = tokio::select! {
                // Prioritize forced closure over pending input.
                biased;
                _ = client.killed() => {
                    debug!("Connection {} was force-closed.", addr);
                    break;
                }
                next = frames.next() => next,
            };

            match next {
                Some(Ok(unit)) => {
                    debug!(
                        "Session {}: Received {} byte(s).",
                        client.session_id(),
                        unit.len()
                    );
                    let result = tokio::select! {
                        biased;
                        _ = client.killed() => {
                            debug!("Connection {} was force-closed mid-request.", addr);
                            break;
                        }
                        result = self.process_unit(client, unit) => result,
                    };
                    if let Err(e) = result {
                        if e.is_normal_disconnect() {
                            debug!("Connection from {} closed while replying: {}", addr, e);
                        } else {
                            warn!("Connection error for {}: {}", addr, e);
                        }
                        break;
                    }
                }
                Some(Err(e)) => {
                    if e.is_normal_disconnect() {
                        debug!("Connection from {} closed by peer: {}", addr, e);
                    } else {
                        warn!("Connection error for {}: {}", addr, e);
                    }
                    break;
                }
                None => {
                    debug!("Connection from {} closed by peer.", addr);
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl<P: LineProcessor> Handler for LineHandler<P> {
    async fn serve(&self, ctx: ConnectionContext, mut stream: TcpStream) {
        let addr = ctx.peer_addr;
        if self.closing.get() || ctx.is_shutting_down() {
            debug!("Rejecting connection from {} during shutdown.", addr);
            let _ = stream.shutdown().await;
            return;
        }

        let (read_half, write_half) = stream.into_split();
        let client = Arc::new(ClientHandle::new(addr, write_half));
        self.registry.store(client.clone());
        let _guard = ConnectionGuard::new(self.registry.clone(), client.session_id(), addr);

        // `close` sets the flag before it walks the registry, so a connection
        // stored after that walk observes the flag here.
        if self.closing.get() {
            debug!("Handler closed while registering {}; closing it.", addr);
            client.kill();
        }

        self.run(&client, FramedRead::new(read_half, LineCodec::new()))
            .await;

        client.shutdown_writer().await;
        debug!(
            "Connection from {} ended after {:?}.",
            addr,
            ctx.accepted_at.elapsed()
        );
    }

    async fn close(&self) -> Result<(), SpinelNetError> {
        info!("Handler shutting down.");
        self.closing.set(true);

        let mut closing = 0usize;
        self.registry.range(|client| {
            closing += 1;
            let client = client.clone();
            tokio::spawn(async move {
                client.close(DEFAULT_GRACE_PERIOD).await;
            });
        });
        info!("Closing {} active connection(s).", closing);
        Ok(())
    }
}
