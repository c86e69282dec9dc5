// src/core/protocol/line_codec.rs

//! A `Decoder` that splits an inbound byte stream into delimiter-terminated units.

use crate::core::SpinelNetError;
use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::debug;

/// The byte that terminates every unit read from a client.
pub const LINE_DELIMITER: u8 = b'\n';

/// Protocol-level limit to prevent a client from buffering unbounded data.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Yields each unit as raw `Bytes`, delimiter included, so a relaying processor
/// can return exactly what the peer sent.
#[derive(Debug)]
pub struct LineCodec {
    max_length: usize,
    /// How far into the buffer the delimiter has already been searched for.
    next_index: usize,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl LineCodec {
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_LENGTH)
    }

    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Decoder for LineCodec {
    type Item = Bytes;
    type Error = SpinelNetError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let search_from = self.next_index.min(src.len());
        match src[search_from..]
            .iter()
            .position(|b| *b == LINE_DELIMITER)
        {
            Some(offset) => {
                let end = search_from + offset + 1;
                self.next_index = 0;
                if end > self.max_length {
                    return Err(SpinelNetError::LineTooLong(self.max_length));
                }
                Ok(Some(src.split_to(end).freeze()))
            }
            None => {
                if src.len() > self.max_length {
                    return Err(SpinelNetError::LineTooLong(self.max_length));
                }
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    /// A trailing unit without its delimiter is discarded, matching a reader
    /// that only ever hands out complete lines.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if !src.is_empty() {
            debug!(
                "Discarding {} undelimited bytes at end of stream.",
                src.len()
            );
            src.clear();
        }
        self.next_index = 0;
        Ok(None)
    }
}
