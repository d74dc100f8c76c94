//! # Types
//!
//! Host-agnostic types used throughout the instrumentation engine.
//!
//! These types abstract away the specifics of the host debugger, allowing the
//! engine to work with concepts like "address", "process ID", and "current
//! source line" without knowing which debug engine is on the other side of the
//! [`DebugHost`](crate::host::DebugHost) trait.

pub mod address;
pub mod source;

use std::fmt;

pub use address::Address;
pub use source::SourceInfo;

/// Process identifier (PID)
///
/// A PID is the system identifier of a debuggee process. Hooks are keyed on
/// the PID so a module loaded in several processes of the same target (e.g.
/// browser and renderer) gets its own hook instance in each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(pub u32);

impl ProcessId
{
    /// Get the raw `u32` representation.
    #[must_use]
    pub const fn raw(self) -> u32
    {
        self.0
    }
}

impl From<u32> for ProcessId
{
    fn from(pid: u32) -> Self
    {
        ProcessId(pid)
    }
}

impl From<ProcessId> for u32
{
    fn from(pid: ProcessId) -> Self
    {
        pid.0
    }
}

impl fmt::Display for ProcessId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// Thread identifier
///
/// Identifies a thread within the debuggee. Stored as a `u64` so the host can
/// put whatever its native representation is behind it (system TID, engine
/// thread index, handle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(pub u64);

impl ThreadId
{
    /// Get the raw `u64` representation.
    #[must_use]
    pub const fn raw(self) -> u64
    {
        self.0
    }
}

impl From<u64> for ThreadId
{
    fn from(value: u64) -> Self
    {
        Self(value)
    }
}

impl fmt::Display for ThreadId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// Executable scratch memory granted by the host.
///
/// Hosts may round the requested size up to an allocation granule, so the
/// granted size is recorded alongside the base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchAllocation
{
    /// Base address of the allocation in the debuggee's address space.
    pub address: Address,
    /// Number of bytes actually granted (>= the requested size).
    pub size: u64,
}
