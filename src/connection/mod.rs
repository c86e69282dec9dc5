// src/connection/mod.rs

//! Manages the lifecycle of client TCP connections: the handler contract the
//! server drives, the registry of open connections, and per-connection handles.

// Declare the private sub-modules of the `connection` module.
mod client;
mod guard;
mod handler;
mod processors;
mod registry;

// Publicly re-export the primary types from the sub-modules.
// This creates a clean public API for the `connection` module, hiding the
// internal file structure from the rest of the crate.
pub use client::{BoxedWriter, ClientHandle, Connection};
pub use handler::{ConnectionContext, DEFAULT_GRACE_PERIOD, EchoHandler, Handler, LineHandler};
pub use processors::{Echo, LineProcessor, Ping};
pub use registry::ConnectionRegistry;
