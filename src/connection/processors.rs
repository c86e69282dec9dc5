// src/connection/processors.rs

//! Per-unit protocol callbacks plugged into a `LineHandler`.

use super::client::Connection;
use crate::core::SpinelNetError;
use crate::core::protocol::reply::{ErrorReply, NoReply, OkReply, PongReply, Reply};
use async_trait::async_trait;
use bytes::Bytes;
use std::str::FromStr;
use strum_macros::EnumString;
use tracing::debug;

/// Turns one delimiter-terminated unit into the bytes to send back.
///
/// Returning an empty `Bytes` sends nothing. Returning an error ends the connection.
#[async_trait]
pub trait LineProcessor: Send + Sync + 'static {
    async fn process(&self, conn: &dyn Connection, unit: Bytes) -> Result<Bytes, SpinelNetError>;
}

/// Sends every unit back to the peer byte for byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct Echo;

#[async_trait]
impl LineProcessor for Echo {
    async fn process(&self, _conn: &dyn Connection, unit: Bytes) -> Result<Bytes, SpinelNetError> {
        Ok(unit)
    }
}

/// The commands understood by [`Ping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
enum PingCommand {
    Ping,
    Select,
}

/// A minimal inline-command protocol: `PING` and `SELECT <db>`.
#[derive(Debug, Clone, Copy)]
pub struct Ping {
    databases: usize,
}

impl Ping {
    pub fn new(databases: usize) -> Self {
        Self { databases }
    }

    pub fn databases(&self) -> usize {
        self.databases
    }

    fn select(&self, conn: &dyn Connection, args: &[&str]) -> Bytes {
        let [index] = args else {
            return wrong_arity("select");
        };
        let Ok(index) = index.parse::<usize>() else {
            return ErrorReply("ERR value is not an integer or out of range".into()).to_bytes();
        };
        if index >= self.databases {
            return ErrorReply(format!(
                "ERR {}",
                SpinelNetError::InvalidDbIndex(index)
            ))
            .to_bytes();
        }
        debug!("Session {}: selecting DB {}", conn.session_id(), index);
        conn.select_db(index);
        OkReply.to_bytes()
    }
}

impl Default for Ping {
    fn default() -> Self {
        Self::new(16)
    }
}

#[async_trait]
impl LineProcessor for Ping {
    async fn process(&self, conn: &dyn Connection, unit: Bytes) -> Result<Bytes, SpinelNetError> {
        let line = String::from_utf8_lossy(&unit);
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return Ok(NoReply.to_bytes());
        };
        let args: Vec<&str> = parts.collect();

        let reply = match PingCommand::from_str(name) {
            Ok(PingCommand::Ping) if args.is_empty() => PongReply.to_bytes(),
            Ok(PingCommand::Ping) => wrong_arity("ping"),
            Ok(PingCommand::Select) => self.select(conn, &args),
            Err(_) => ErrorReply(format!("ERR unknown command '{name}'")).to_bytes(),
        };
        Ok(reply)
    }
}

fn wrong_arity(command: &str) -> Bytes {
    ErrorReply(format!(
        "ERR wrong number of arguments for '{command}' command"
    ))
    .to_bytes()
}
