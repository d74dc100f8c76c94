//! # Mojostep Utilities
//!
//! Shared utilities, logging, and helpers for mojostep.
//!
//! This crate provides common functionality used across the mojostep
//! workspace, including logging infrastructure built on `tracing` and the
//! module-name normalization helpers used by the hooking engine.

pub mod logging;
pub mod names;

// Re-export commonly used logging functions for convenience
pub use logging::{init_logging, init_logging_to_file, init_logging_with_level, LogFormat, LogLevel};
pub use tracing::{debug, error, info, trace, warn};
