// src/core/protocol/reply.rs

//! Fixed reply byte sequences for canonical acknowledgements.
//!
//! The connection layer never builds replies on its own; protocol processors
//! hand these bytes to the connection, which relays them unchanged.

use bytes::Bytes;

/// Anything that can be written back to a client as a complete reply.
pub trait Reply {
    fn to_bytes(&self) -> Bytes;
}

const PONG_BYTES: &[u8] = b"+PONG\r\n";
const OK_BYTES: &[u8] = b"+OK\r\n";
const NULL_BULK_BYTES: &[u8] = b"$-1\r\n";
const EMPTY_MULTI_BULK_BYTES: &[u8] = b"*0\r\n";

/// `+PONG`
#[derive(Debug, Clone, Copy, Default)]
pub struct PongReply;

impl Reply for PongReply {
    fn to_bytes(&self) -> Bytes {
        Bytes::from_static(PONG_BYTES)
    }
}

/// `+OK`
#[derive(Debug, Clone, Copy, Default)]
pub struct OkReply;

impl Reply for OkReply {
    fn to_bytes(&self) -> Bytes {
        Bytes::from_static(OK_BYTES)
    }
}

/// A null bulk string, used for missing values.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBulkReply;

impl Reply for NullBulkReply {
    fn to_bytes(&self) -> Bytes {
        Bytes::from_static(NULL_BULK_BYTES)
    }
}

/// An empty array.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyMultiBulkReply;

impl Reply for EmptyMultiBulkReply {
    fn to_bytes(&self) -> Bytes {
        Bytes::from_static(EMPTY_MULTI_BULK_BYTES)
    }
}

/// Writes nothing at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReply;

impl Reply for NoReply {
    fn to_bytes(&self) -> Bytes {
        Bytes::new()
    }
}

/// A protocol-level error line, e.g. `-ERR unknown command 'FOO'`.
#[derive(Debug, Clone)]
pub struct ErrorReply(pub String);

impl Reply for ErrorReply {
    fn to_bytes(&self) -> Bytes {
        // Embedded line breaks would split the reply into two frames.
        let message = self.0.replace(['\r', '\n'], " ");
        let mut buf = Vec::with_capacity(message.len() + 3);
        buf.push(b'-');
        buf.extend_from_slice(message.as_bytes());
        buf.extend_from_slice(b"\r\n");
        Bytes::from(buf)
    }
}
