// src/core/errors.rs

//! Defines the primary error type for the connection layer.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the server.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
#[derive(Error, Debug)]
pub enum SpinelNetError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Failed to bind listener on '{addr}': {source}")]
    Bind {
        addr: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("Protocol error: line exceeds the maximum length of {0} bytes")]
    LineTooLong(usize),

    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("DB index {0} is out of range")]
    InvalidDbIndex(usize),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SpinelNetError {
    /// Returns true for I/O failures that simply mean the peer went away.
    pub fn is_normal_disconnect(&self) -> bool {
        matches!(self, SpinelNetError::ConnectionClosed)
            || matches!(self, SpinelNetError::Io(e) if matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionAborted
            ))
    }
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
// We wrap it in an Arc to allow for cheap, shared cloning.
impl Clone for SpinelNetError {
    fn clone(&self) -> Self {
        match self {
            SpinelNetError::Io(e) => SpinelNetError::Io(Arc::clone(e)),
            SpinelNetError::Bind { addr, source } => SpinelNetError::Bind {
                addr: addr.clone(),
                source: Arc::clone(source),
            },
            SpinelNetError::LineTooLong(n) => SpinelNetError::LineTooLong(*n),
            SpinelNetError::ConnectionClosed => SpinelNetError::ConnectionClosed,
            SpinelNetError::InvalidDbIndex(i) => SpinelNetError::InvalidDbIndex(*i),
            SpinelNetError::Config(s) => SpinelNetError::Config(s.clone()),
        }
    }
}

impl PartialEq for SpinelNetError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SpinelNetError::Io(e1), SpinelNetError::Io(e2)) => e1.kind() == e2.kind(),
            (
                SpinelNetError::Bind { addr: a1, .. },
                SpinelNetError::Bind { addr: a2, .. },
            ) => a1 == a2,
            (SpinelNetError::LineTooLong(n1), SpinelNetError::LineTooLong(n2)) => n1 == n2,
            (SpinelNetError::InvalidDbIndex(i1), SpinelNetError::InvalidDbIndex(i2)) => i1 == i2,
            (SpinelNetError::Config(s1), SpinelNetError::Config(s2)) => s1 == s2,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl From<std::io::Error> for SpinelNetError {
    fn from(e: std::io::Error) -> Self {
        SpinelNetError::Io(Arc::new(e))
    }
}
