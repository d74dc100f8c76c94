//! # mojostep-core
//!
//! Debugger-side instrumentation engine for stepping into Chromium Mojo IPC
//! message handlers.
//!
//! Mojo dispatch is table-driven: a message arrives as bytes and a generated
//! stub picks the handler, so an ordinary "step into" from the sending side
//! lands in serialization plumbing instead of the handler. This crate patches
//! the one function every validated message passes through with a trampoline
//! that checks a marker bit in the message header and traps only for marked
//! messages, then walks the target from that trap into the generated handler.
//!
//! The crate is host-agnostic. Everything it needs from the debugger it drives
//! through the [`DebugHost`](host::DebugHost) trait; wiring a concrete debug
//! engine (or a scripted mock) to that trait is the embedder's job.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mojostep_core::prelude::*;
//!
//! let mut session = InstrumentationSession::new();
//! session.watch_module("app");
//! // Forward the host's notifications:
//! session.handle_notification(&mut host, &HostNotification::ModuleLoaded { name: "app.dll".into() });
//! session.handle_notification(&mut host, &HostNotification::Suspended);
//! ```

pub mod context;
pub mod error;
pub mod events;
pub mod hooks;
pub mod host;
pub mod prelude;
pub mod session;
pub mod stepping;
pub mod types;

pub use context::ContextGuard;
// Re-export commonly used types
pub use error::{MojostepError, MojostepResult};
pub use events::HostNotification;
pub use host::{DebugHost, ExecutionMode};
pub use session::{HookInstance, InstrumentationSession};
pub use types::{Address, ProcessId, ThreadId};
