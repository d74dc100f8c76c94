//! # Host Debugger Trait
//!
//! The interface for everything the engine consumes from its host debugger.
//!
//! The engine never touches the debuggee directly: reading and writing memory,
//! resolving symbols, stepping, and switching focus all go through this trait.
//! A production backend wraps a real debug engine; tests drive the engine with
//! a scripted mock.
//!
//! ## Design Philosophy
//!
//! The trait methods are designed to be:
//! - **Simple**: Each method maps to one host capability
//! - **Synchronous**: Issue one command, block until the debuggee reports
//!   suspension, inspect state, decide the next action
//! - **Explicit**: Clear about what they do and when they can fail
//!
//! ## Thread Safety
//!
//! All control and query operations on the debuggee must originate from the
//! one thread the host dedicates to them. The trait takes `&mut self`
//! everywhere and nothing in the engine is re-entrant: a second suspend
//! notification is not processed until the in-flight stepping sequence
//! completes, because notification delivery is itself sequential on that
//! thread.

use std::time::Duration;

use crate::error::MojostepResult;
use crate::types::{Address, ProcessId, ScratchAllocation, SourceInfo, ThreadId};

/// How the target should run when execution is next released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode
{
    /// Execute one instruction, descending into calls.
    StepInto,
    /// Execute one instruction, treating calls as a unit.
    StepOver,
    /// Run until the current function returns to its caller.
    StepOut,
    /// Resume free execution.
    Continue,
}

/// Capabilities the engine consumes from the host debugger.
///
/// Every method operates on the host's *current* process and thread; the
/// engine uses [`ContextGuard`](crate::context::ContextGuard) to keep those
/// anchored while it steps.
pub trait DebugHost
{
    /// Read `len` bytes of debuggee memory starting at `address`.
    ///
    /// ## Errors
    ///
    /// `MemoryReadFailed` when the range is unmapped or the read is short.
    fn read_memory(&mut self, address: Address, len: usize) -> MojostepResult<Vec<u8>>;

    /// Write bytes into debuggee memory at `address`.
    ///
    /// ## Errors
    ///
    /// `MemoryWriteFailed` when the range is unmapped, read-only, or the
    /// write is short.
    fn write_memory(&mut self, address: Address, bytes: &[u8]) -> MojostepResult<()>;

    /// Allocate executable scratch memory of at least `size` bytes in the
    /// debuggee's address space.
    ///
    /// The host may round the size up to its allocation granule; the granted
    /// size comes back in the [`ScratchAllocation`].
    ///
    /// ## Errors
    ///
    /// `AllocationFailed` when the debuggee is out of address space or the
    /// host refuses the request.
    fn allocate_executable(&mut self, size: usize) -> MojostepResult<ScratchAllocation>;

    /// Resolve a module-qualified exported symbol (e.g.
    /// `chrome!mojo::InterfaceEndpointClient::HandleValidatedMessage`) to its
    /// address in the current process.
    ///
    /// ## Errors
    ///
    /// `SymbolNotFound` when the symbol is unknown to the host.
    fn resolve_symbol(&mut self, module_qualified_name: &str) -> MojostepResult<Address>;

    /// Current instruction pointer of the current thread.
    fn instruction_pointer(&mut self) -> MojostepResult<Address>;

    /// Release execution in the given mode.
    ///
    /// For the step modes the caller is expected to follow up with
    /// [`wait_for_suspend`](DebugHost::wait_for_suspend) before inspecting
    /// any state.
    fn set_execution_mode(&mut self, mode: ExecutionMode) -> MojostepResult<()>;

    /// Block until the debuggee reports suspension, or `timeout` elapses.
    ///
    /// ## Errors
    ///
    /// `SuspendWaitTimedOut` when the target keeps running past the timeout.
    fn wait_for_suspend(&mut self, timeout: Duration) -> MojostepResult<()>;

    /// Top of the current thread's call stack, most-recent frame first.
    ///
    /// One rendered symbol string per frame. With `include_arguments` the
    /// frame text also carries the parameter list the debugger would display
    /// (used to tell constructor overloads apart).
    fn call_stack(&mut self, max_depth: usize, include_arguments: bool) -> MojostepResult<Vec<String>>;

    /// Source file/line for the current instruction pointer, if the host has
    /// line information there. Generated dispatch code is recognized by its
    /// file suffix, so this is queried on every scan iteration.
    fn current_source(&mut self) -> MojostepResult<Option<SourceInfo>>;

    /// System id of the host's current process.
    fn current_process_id(&mut self) -> MojostepResult<ProcessId>;

    /// Id of the host's current thread.
    fn current_thread_id(&mut self) -> MojostepResult<ThreadId>;

    /// Re-select the given process as current.
    fn set_current_process(&mut self, process: ProcessId) -> MojostepResult<()>;

    /// Re-select the given thread as current.
    fn set_current_thread(&mut self, thread: ThreadId) -> MojostepResult<()>;

    /// Evaluate an expression in the current frame, returning the host's
    /// textual result.
    ///
    /// Only the manual trigger uses this, to flip the step-through flag on an
    /// in-flight message from inside its constructor.
    fn evaluate(&mut self, expression: &str) -> MojostepResult<String>;
}
