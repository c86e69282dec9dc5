// tests/integration/echo_server_test.rs

//! End-to-end tests of the accept loop with the echo handler.

use super::test_helpers::{TestServer, read_to_close, round_trip, wait_until};
use spinelnet::connection::EchoHandler;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[tokio::test]
async fn test_three_clients_echo_then_shutdown() {
    let server = TestServer::start(EchoHandler::default()).await;

    let mut clients = Vec::new();
    for _ in 0..3 {
        clients.push(server.connect().await);
    }
    assert!(
        wait_until(Duration::from_secs(5), || server.handler.registry().len() == 3).await,
        "all three connections should be registered"
    );

    for (i, client) in clients.iter_mut().enumerate() {
        let message = format!("hello from client {i}\n");
        let reply = round_trip(client, message.as_bytes()).await;
        assert_eq!(reply, message.as_bytes());
    }

    let handler = server.handler.clone();
    server.shutdown(Duration::from_secs(10)).await;

    for client in clients.iter_mut() {
        let rest = read_to_close(client, Duration::from_secs(10)).await;
        assert!(rest.is_empty());
    }
    assert!(handler.registry().is_empty());
    assert!(handler.is_closing());
}

#[tokio::test]
async fn test_echo_preserves_exact_bytes() {
    let server = TestServer::start(EchoHandler::default()).await;
    let mut client = server.connect().await;

    let message = b"  mixed\tcase \xF0\x9F\xA6\x80 \r\n";
    assert_eq!(round_trip(&mut client, message).await, message.to_vec());

    // Two units in one write come back as two units, in order.
    let pipelined = b"first\nsecond\n";
    assert_eq!(round_trip(&mut client, pipelined).await, pipelined.to_vec());

    server.shutdown(Duration::from_secs(10)).await;
}

#[tokio::test]
async fn test_unit_split_across_writes_is_reassembled() {
    let server = TestServer::start(EchoHandler::default()).await;
    let mut client = server.connect().await;

    client.write_all(b"par").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    client.write_all(b"tial\n").await.unwrap();

    let mut reply = [0u8; 8];
    tokio::time::timeout(Duration::from_secs(5), client.read_exact(&mut reply))
        .await
        .expect("Timed out waiting for reply")
        .unwrap();
    assert_eq!(&reply, b"partial\n");

    server.shutdown(Duration::from_secs(10)).await;
}

#[tokio::test]
async fn test_registry_tracks_connects_and_disconnects() {
    let server = TestServer::start(EchoHandler::default()).await;
    let registry_len = || server.handler.registry().len();

    let first = server.connect().await;
    let mut second = server.connect().await;
    assert!(wait_until(Duration::from_secs(5), || registry_len() == 2).await);

    drop(first);
    assert!(wait_until(Duration::from_secs(5), || registry_len() == 1).await);

    // The remaining connection is still served.
    assert_eq!(round_trip(&mut second, b"still here\n").await, b"still here\n");

    second.shutdown().await.unwrap();
    drop(second);
    assert!(wait_until(Duration::from_secs(5), || registry_len() == 0).await);

    server.shutdown(Duration::from_secs(10)).await;
}

#[tokio::test]
async fn test_partial_line_at_eof_is_dropped() {
    let server = TestServer::start(EchoHandler::default()).await;
    let mut client = server.connect().await;

    client.write_all(b"no newline").await.unwrap();
    client.shutdown().await.unwrap();

    // The server never replies to an undelimited unit and closes on EOF.
    let rest = read_to_close(&mut client, Duration::from_secs(5)).await;
    assert!(rest.is_empty());
    assert!(wait_until(Duration::from_secs(5), || server.handler.registry().is_empty()).await);

    server.shutdown(Duration::from_secs(10)).await;
}

#[tokio::test]
async fn test_overlong_line_closes_only_that_connection() {
    let server = TestServer::start(EchoHandler::default()).await;
    let mut noisy = server.connect().await;
    let mut quiet = server.connect().await;

    let junk = vec![b'x'; spinelnet::core::protocol::MAX_LINE_LENGTH + 1];
    // The server may reset the stream before the whole write lands.
    let _ = noisy.write_all(&junk).await;
    let _ = read_to_close(&mut noisy, Duration::from_secs(5)).await;

    assert_eq!(round_trip(&mut quiet, b"ok\n").await, b"ok\n");
    server.shutdown(Duration::from_secs(10)).await;
}
