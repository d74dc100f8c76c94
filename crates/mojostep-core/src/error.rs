//! # Error Types
//!
//! General error handling for the instrumentation engine.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! All of these failures are non-fatal to the overall session: the event
//! handlers in [`session`](crate::session) catch them, log a diagnostic, and
//! degrade to "this one instrumentation attempt does nothing further".

use thiserror::Error;

use crate::types::{Address, ProcessId, ThreadId};

/// Main error type for engine operations
///
/// ## Error Categories
///
/// 1. **Detection misses**: SymbolNotFound, UnrecognizedFunction — the module
///    stays unpatched, everything else keeps working
/// 2. **Patch-application failures**: MemoryReadFailed, MemoryWriteFailed,
///    AllocationFailed — the specific hook attempt is abandoned; previously
///    applied hooks remain intact
/// 3. **Stepping anomalies**: StepFailed, SuspendWaitTimedOut,
///    FocusNotRestored — the in-flight stepping sequence aborts and the
///    target resumes free execution
/// 4. **Host errors**: Host, Io — whatever the concrete host backend needs to
///    surface
#[derive(Error, Debug)]
pub enum MojostepError
{
    /// The module-qualified symbol could not be resolved in the debuggee
    ///
    /// Typically means symbols for the module are not loaded, or the build in
    /// the target simply does not export the dispatch function.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// No catalog signature matched the bytes at the target function
    ///
    /// The function was found but its compiled form is not one of the known
    /// variants — a different compiler configuration, or a newer build whose
    /// prologue changed. Only this (process, module) pairing is skipped.
    #[error("No known signature matches the target function in {module}")]
    UnrecognizedFunction
    {
        /// Normalized module name whose dispatch function was probed.
        module: String,
    },

    /// Failed to read debuggee memory
    #[error("Failed to read {len} bytes at {address}")]
    MemoryReadFailed
    {
        /// Address the read started at.
        address: Address,
        /// Number of bytes requested.
        len: usize,
    },

    /// Failed to write debuggee memory
    #[error("Failed to write {len} bytes at {address}")]
    MemoryWriteFailed
    {
        /// Address the write started at.
        address: Address,
        /// Number of bytes in the write.
        len: usize,
    },

    /// Failed to allocate executable scratch memory in the debuggee
    #[error("Failed to allocate {size} bytes of executable scratch memory")]
    AllocationFailed
    {
        /// Requested allocation size in bytes.
        size: usize,
    },

    /// A step / continue command was rejected by the host
    #[error("Step command failed: {0}")]
    StepFailed(String),

    /// The target did not report suspension within the wait timeout
    #[error("Timed out waiting for the target to suspend")]
    SuspendWaitTimedOut,

    /// Debugger focus drifted and could not be brought back
    ///
    /// Concurrent activity on other threads moved the debugger's current
    /// process/thread during a step and re-selecting the originals failed.
    /// Stack queries would read the wrong stack, so the sequence aborts.
    #[error("Debugger focus could not be restored to process {process}, thread {thread}")]
    FocusNotRestored
    {
        /// Process the stepping sequence was anchored to.
        process: ProcessId,
        /// Thread the stepping sequence was anchored to.
        thread: ThreadId,
    },

    /// Backend-specific host failure that fits no other category
    #[error("Host error: {0}")]
    Host(String),

    /// I/O error (for file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, MojostepError>`
///
/// ```rust
/// use mojostep_core::error::MojostepResult;
/// fn foo() -> MojostepResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type MojostepResult<T> = std::result::Result<T, MojostepError>;
