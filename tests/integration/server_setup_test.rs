// tests/integration/server_setup_test.rs

//! Startup: binding, bind failures, and handler selection from the config.

use super::test_helpers::{init_tracing, request};
use spinelnet::config::{Config, Protocol};
use spinelnet::core::SpinelNetError;
use spinelnet::server::{self, listen_and_serve, shutdown_channel};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

fn local_config(port: u16, protocol: Protocol) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port,
        protocol,
        ..Config::default()
    }
}

#[tokio::test]
async fn test_bind_failure_is_reported_before_serving() {
    init_tracing();
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = occupied.local_addr().unwrap().port();

    let err = match server::setup(&local_config(port, Protocol::Echo)).await {
        Ok(_) => panic!("binding an occupied port should fail"),
        Err(e) => e,
    };
    let bind_err = err
        .downcast_ref::<SpinelNetError>()
        .expect("bind failures are reported as SpinelNetError");
    assert!(matches!(bind_err, SpinelNetError::Bind { addr, .. } if addr == &format!("127.0.0.1:{port}")));
}

#[tokio::test]
async fn test_run_reports_bind_failure() {
    init_tracing();
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = occupied.local_addr().unwrap().port();

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        server::run(local_config(port, Protocol::Echo)),
    )
    .await
    .expect("run should fail immediately");
    assert!(result.is_err());
}

#[tokio::test]
async fn test_setup_serves_configured_protocol() {
    init_tracing();
    let context = server::setup(&local_config(0, Protocol::Ping))
        .await
        .expect("setup should bind an ephemeral port");
    let addr = context.local_addr;
    assert_ne!(addr.port(), 0);

    let (trigger, signal) = shutdown_channel();
    let task = tokio::spawn(listen_and_serve(context.listener, context.handler, signal));

    let mut client = TcpStream::connect(addr).await.unwrap();
    assert_eq!(request(&mut client, b"PING\n").await, b"+PONG\r\n");

    trigger.trigger();
    tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .expect("server did not stop")
        .unwrap();
}
