//! Process execution layer for the lockcheck harness.
//!
//! This crate provides a small command builder, the `ProcessOperations`
//! trait scenarios run commands through, and a tokio-backed implementation
//! with per-command timeouts and structured tracing.

pub mod implementations;
pub mod process;

pub use implementations::native::NativeProcessOperations;

/// Re-export commonly used types
pub use process::{CommandOutput, PlatformCommand, ProcessOperations};
