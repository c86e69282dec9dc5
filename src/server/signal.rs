// src/server/signal.rs

//! Bridges OS termination signals to the server's shutdown trigger.

use super::shutdown::ShutdownTrigger;
use tokio::task::JoinHandle;
use tracing::info;

/// Subscribes to SIGHUP, SIGQUIT, SIGTERM and SIGINT and fires `trigger` once,
/// on the first of them. Handlers are installed before this returns.
#[cfg(unix)]
pub fn spawn_signal_bridge(trigger: ShutdownTrigger) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigquit = signal(SignalKind::quit())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        let name = tokio::select! {
            _ = sighup.recv() => "SIGHUP",
            _ = sigquit.recv() => "SIGQUIT",
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("{} received, initiating graceful shutdown.", name);
        trigger.trigger();
    }))
}

#[cfg(not(unix))]
pub fn spawn_signal_bridge(trigger: ShutdownTrigger) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, initiating graceful shutdown.");
            trigger.trigger();
        }
    }))
}
