// src/core/mod.rs

//! The central module containing the shared building blocks of SpinelNet.

pub mod errors;
pub mod protocol;
pub mod sync;

pub use errors::SpinelNetError;
