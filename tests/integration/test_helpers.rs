// tests/integration/test_helpers.rs

//! Test helpers for running a real server on an ephemeral port.

use async_trait::async_trait;
use spinelnet::connection::{ConnectionContext, EchoHandler, Handler};
use spinelnet::core::SpinelNetError;
use spinelnet::server::{ShutdownTrigger, listen_and_serve, shutdown_channel};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

/// Sets up minimal tracing for tests (ignores the error if already initialized).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .with_test_writer()
        .try_init();
}

/// A server running `listen_and_serve` in a background task.
pub struct TestServer<H: Handler> {
    pub addr: SocketAddr,
    pub handler: Arc<H>,
    pub trigger: ShutdownTrigger,
    pub task: JoinHandle<()>,
}

impl<H: Handler> TestServer<H> {
    /// Binds `127.0.0.1:0` and starts serving with `handler`.
    pub async fn start(handler: H) -> Self {
        init_tracing();
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no local address");
        let handler = Arc::new(handler);
        let (trigger, signal) = shutdown_channel();
        let task = tokio::spawn(listen_and_serve(listener, handler.clone(), signal));
        Self {
            addr,
            handler,
            trigger,
            task,
        }
    }

    pub async fn connect(&self) -> TcpStream {
        TcpStream::connect(self.addr)
            .await
            .expect("Failed to connect to test server")
    }

    /// Requests shutdown and waits for the accept loop to return.
    pub async fn shutdown(self, limit: Duration) {
        self.trigger.trigger();
        tokio::time::timeout(limit, self.task)
            .await
            .expect("Server did not shut down in time")
            .expect("Server task panicked");
    }
}

/// Wraps an `EchoHandler` and counts `close` calls.
#[derive(Default)]
pub struct CountingHandler {
    pub inner: EchoHandler,
    pub closes: AtomicUsize,
}

impl CountingHandler {
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Handler for CountingHandler {
    async fn serve(&self, ctx: ConnectionContext, stream: TcpStream) {
        self.inner.serve(ctx, stream).await
    }

    async fn close(&self) -> Result<(), SpinelNetError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close().await
    }
}

/// Polls `condition` every few milliseconds until it holds or `limit` elapses.
pub async fn wait_until<F>(limit: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Sends `message` and reads back exactly as many bytes.
pub async fn round_trip(stream: &mut TcpStream, message: &[u8]) -> Vec<u8> {
    stream.write_all(message).await.expect("write failed");
    let mut buf = vec![0u8; message.len()];
    tokio::time::timeout(Duration::from_secs(5), stream.read_exact(&mut buf))
        .await
        .expect("Timed out waiting for reply")
        .expect("read failed");
    buf
}

/// Sends `message` and reads back one reply line, delimiter included.
pub async fn request(stream: &mut TcpStream, message: &[u8]) -> Vec<u8> {
    stream.write_all(message).await.expect("write failed");
    let mut line = Vec::new();
    let read_line = async {
        loop {
            let byte = stream.read_u8().await.expect("read failed");
            line.push(byte);
            if byte == b'\n' {
                break;
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), read_line)
        .await
        .expect("Timed out waiting for reply");
    line
}

/// Reads until the server closes the stream. Returns whatever arrived first.
pub async fn read_to_close(stream: &mut TcpStream, limit: Duration) -> Vec<u8> {
    let mut buf = Vec::new();
    match tokio::time::timeout(limit, stream.read_to_end(&mut buf)).await {
        Ok(Ok(_)) => {}
        // A reset also means the server closed the connection.
        Ok(Err(e)) => assert!(
            matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted
            ),
            "unexpected read error: {e}"
        ),
        Err(_) => panic!("Stream was not closed within {limit:?}"),
    }
    buf
}
