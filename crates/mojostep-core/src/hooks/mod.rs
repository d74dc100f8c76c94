//! # Hook Definitions
//!
//! The closed catalog of known compiled shapes of the dispatch function, and
//! the machinery to recognize and patch each shape.
//!
//! A [`HookDefinition`] is data, not behavior: a byte [`Signature`] with
//! declared wildcard regions, a [`TrampolineTemplate`] with named relocation
//! slots, and a couple of fixed counts. Adding support for a new compiled
//! shape means adding a catalog entry in [`catalog`], not touching any
//! dispatch logic.
//!
//! Patching is used instead of a conditional breakpoint because the dispatch
//! function runs for every in-flight message; embedding the flag check as
//! machine code means the debugger is only woken up when the check actually
//! passes.

mod catalog;
pub mod template;

use std::ops::Range;

use tracing::debug;

pub use catalog::catalog;
pub use template::{RelocationSlot, SlotKind, TrampolineTemplate};

use crate::error::{MojostepError, MojostepResult};
use crate::host::DebugHost;
use crate::types::{Address, ScratchAllocation};

/// The `int3` is padded with no-ops so no mid-instruction boundary is left
/// corrupted when the patch is shorter than the displaced prologue.
const NOP: u8 = 0x90;

/// A golden byte pattern with declared "don't care" regions.
///
/// Wildcard regions cover fields that vary between builds of the same shape:
/// a stack-frame-size immediate, a rip-relative displacement. Every byte
/// outside them must match exactly.
#[derive(Debug, Clone)]
pub struct Signature
{
    pattern: Vec<u8>,
    wildcards: Vec<Range<usize>>,
}

impl Signature
{
    /// A signature where every byte must match.
    pub(crate) fn exact(pattern: Vec<u8>) -> Self
    {
        Self {
            pattern,
            wildcards: Vec::new(),
        }
    }

    /// A signature with wildcard byte ranges.
    pub(crate) fn with_wildcards(pattern: Vec<u8>, wildcards: Vec<Range<usize>>) -> Self
    {
        for range in &wildcards {
            assert!(range.end <= pattern.len(), "wildcard range {range:?} exceeds pattern");
        }
        Self { pattern, wildcards }
    }

    /// Number of bytes the signature covers.
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.pattern.len()
    }

    /// True when the pattern is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.pattern.is_empty()
    }

    /// Compare against already-read bytes. Wildcard regions are skipped.
    #[must_use]
    pub fn matches(&self, bytes: &[u8]) -> bool
    {
        if bytes.len() < self.pattern.len() {
            return false;
        }
        self.pattern
            .iter()
            .enumerate()
            .all(|(i, expected)| self.is_wildcard(i) || bytes[i] == *expected)
    }

    /// Read the signature window from debuggee memory and compare.
    ///
    /// Any read failure yields `false`; recognition never propagates errors.
    pub fn check<H: DebugHost + ?Sized>(&self, host: &mut H, address: Address) -> bool
    {
        match host.read_memory(address, self.pattern.len()) {
            Ok(bytes) => self.matches(&bytes),
            Err(err) => {
                debug!("Signature read at {address} failed: {err}");
                false
            }
        }
    }

    fn is_wildcard(&self, index: usize) -> bool
    {
        self.wildcards.iter().any(|range| range.contains(&index))
    }
}

/// One recognized compiled shape of the dispatch function.
///
/// Immutable after registration; definitions live for the whole
/// instrumentation session.
#[derive(Debug, Clone)]
pub struct HookDefinition
{
    name: &'static str,
    signature: Signature,
    template: TrampolineTemplate,
    consumed_len: usize,
    breakpoint_offset: usize,
    steps_to_exit: u32,
}

/// Addresses produced by a successful patch application.
#[derive(Debug, Clone, Copy)]
pub struct AppliedPatch
{
    /// The executable scratch allocation holding the trampoline.
    pub trampoline: ScratchAllocation,
    /// Address of the embedded `int3` inside the trampoline.
    pub breakpoint_address: Address,
    /// Where unpatched execution resumes (target + consumed bytes).
    pub continuation_address: Address,
}

impl HookDefinition
{
    pub(crate) fn new(
        name: &'static str,
        signature: Signature,
        template: TrampolineTemplate,
        consumed_len: usize,
        breakpoint_offset: usize,
        steps_to_exit: u32,
    ) -> Self
    {
        assert_eq!(signature.len(), consumed_len, "signature window must cover the displaced prologue");
        assert!(breakpoint_offset < template.len(), "breakpoint offset outside template");
        Self {
            name,
            signature,
            template,
            consumed_len,
            breakpoint_offset,
            steps_to_exit,
        }
    }

    /// Short stable name of the variant (shows up in diagnostics and the
    /// hooks listing).
    #[must_use]
    pub fn name(&self) -> &'static str
    {
        self.name
    }

    /// The recognition signature.
    #[must_use]
    pub fn signature(&self) -> &Signature
    {
        &self.signature
    }

    /// The trampoline template.
    #[must_use]
    pub fn template(&self) -> &TrampolineTemplate
    {
        &self.template
    }

    /// Number of prologue bytes the patch displaces.
    #[must_use]
    pub fn consumed_len(&self) -> usize
    {
        self.consumed_len
    }

    /// Fixed number of step-over operations that walk from the trampoline
    /// breakpoint back to where unpatched execution would have continued.
    #[must_use]
    pub fn steps_to_exit(&self) -> u32
    {
        self.steps_to_exit
    }

    /// Probe the bytes at `address` against this variant's signature.
    pub fn check_signature<H: DebugHost + ?Sized>(&self, host: &mut H, address: Address) -> bool
    {
        self.signature.check(host, address)
    }

    /// Apply this variant's patch to the function at `target`.
    ///
    /// Reads the prologue, allocates executable scratch, renders and writes
    /// the trampoline, then overwrites the prologue with an absolute jump to
    /// it. A failure at any point abandons the attempt; nothing is registered
    /// and previously applied hooks are unaffected.
    ///
    /// ## Errors
    ///
    /// `MemoryReadFailed`, `AllocationFailed`, or `MemoryWriteFailed` from the
    /// corresponding host operation.
    pub fn apply<H: DebugHost + ?Sized>(&self, host: &mut H, target: Address) -> MojostepResult<AppliedPatch>
    {
        let prologue = host.read_memory(target, self.consumed_len)?;
        if prologue.len() != self.consumed_len {
            return Err(MojostepError::MemoryReadFailed {
                address: target,
                len: self.consumed_len,
            });
        }

        let trampoline = host.allocate_executable(self.template.len())?;
        let continuation = target + self.consumed_len as u64;

        let trampoline_bytes = self.template.render(&prologue, target, continuation);
        host.write_memory(trampoline.address, &trampoline_bytes)?;

        // Only now touch the original function; a failed trampoline write
        // must leave the target untouched.
        let patch = absolute_jump_patch(trampoline.address, self.consumed_len);
        host.write_memory(target, &patch)?;

        Ok(AppliedPatch {
            trampoline,
            breakpoint_address: trampoline.address + self.breakpoint_offset as u64,
            continuation_address: continuation,
        })
    }
}

/// Bytes that overwrite the original prologue: `jmp qword ptr [rip+0]`
/// followed by the absolute trampoline address, NOP-padded to `pad_to`.
#[must_use]
pub(crate) fn absolute_jump_patch(trampoline: Address, pad_to: usize) -> Vec<u8>
{
    let mut bytes = vec![0xFF, 0x25, 0x00, 0x00, 0x00, 0x00];
    bytes.extend_from_slice(&trampoline.value().to_le_bytes());
    if pad_to > bytes.len() {
        bytes.resize(pad_to, NOP);
    }
    bytes
}
