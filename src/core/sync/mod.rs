// src/core/sync/mod.rs

//! Small concurrency primitives shared by the connection layer and the server loop.

pub mod atomic;
pub mod wait;

pub use atomic::AtomicFlag;
pub use wait::{Wait, WaitGuard, WaitOutcome};
