// src/core/protocol/mod.rs

pub mod line_codec;
pub mod reply;
pub use line_codec::{LINE_DELIMITER, LineCodec, MAX_LINE_LENGTH};
pub use reply::Reply;
