//! Trampoline byte templates with structured relocation slots.
//!
//! A trampoline is assembled from a fixed code template plus a handful of
//! values only known at patch time: where unpatched execution resumes, which
//! prologue bytes were displaced, and (for stack-protector builds) the
//! absolute address of a rip-relative datum. Each of those is declared as a
//! [`RelocationSlot`] instead of being patched at a bare numeric offset, so
//! the patch builder can be reviewed and unit-tested without a live process.

use crate::types::Address;

/// What gets written into a relocation slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind
{
    /// Little-endian `u64` absolute address where unpatched execution
    /// resumes: the original function plus the consumed byte count.
    ContinuationAddress,
    /// Bytes copied verbatim from the displaced prologue.
    CopiedOriginal
    {
        /// Offset into the displaced prologue to copy from.
        source_offset: usize,
        /// Number of bytes to copy.
        len: usize,
    },
    /// Little-endian `u64` absolute address of a rip-relative datum referenced
    /// by the displaced prologue (e.g. the stack-protector cookie).
    ///
    /// Resolved as `target + next_instruction_offset + disp`, where `disp` is
    /// the little-endian `i32` at `prologue[disp_offset..disp_offset + 4]`.
    RipResolvedAddress
    {
        /// Offset of the 4-byte displacement inside the displaced prologue.
        disp_offset: usize,
        /// Offset of the instruction following the rip-relative one, relative
        /// to the original function start (rip points there).
        next_instruction_offset: usize,
    },
}

/// One relocation slot: where in the template, and what goes there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelocationSlot
{
    /// Byte offset of the slot inside the template code.
    pub offset: usize,
    /// Value written into the slot at render time.
    pub kind: SlotKind,
}

impl RelocationSlot
{
    const fn width(&self) -> usize
    {
        match self.kind {
            SlotKind::ContinuationAddress | SlotKind::RipResolvedAddress { .. } => 8,
            SlotKind::CopiedOriginal { len, .. } => len,
        }
    }
}

/// A trampoline code template plus its relocation slots.
#[derive(Debug, Clone)]
pub struct TrampolineTemplate
{
    code: Vec<u8>,
    slots: Vec<RelocationSlot>,
}

impl TrampolineTemplate
{
    /// Build a template, validating that every slot fits inside the code.
    ///
    /// Templates are closed catalog data; an out-of-bounds slot is a bug in
    /// the catalog, not a runtime condition, hence the assertions.
    pub(crate) fn new(code: Vec<u8>, slots: Vec<RelocationSlot>) -> Self
    {
        for slot in &slots {
            assert!(
                slot.offset + slot.width() <= code.len(),
                "relocation slot at offset {} (width {}) exceeds template of {} bytes",
                slot.offset,
                slot.width(),
                code.len()
            );
        }
        Self { code, slots }
    }

    /// Size of the rendered trampoline in bytes.
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.code.len()
    }

    /// True when the template holds no code.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.code.is_empty()
    }

    /// Declared relocation slots, in template order.
    #[must_use]
    pub fn slots(&self) -> &[RelocationSlot]
    {
        &self.slots
    }

    /// Render the final trampoline bytes.
    ///
    /// `prologue` holds the bytes displaced from the original function (the
    /// consumed byte count of the owning definition), `target` is the original
    /// function address, and `continuation` is where unpatched execution
    /// resumes.
    ///
    /// ## Panics
    ///
    /// `prologue` must cover every slot's source range; a shorter slice is a
    /// caller bug (the patch path always reads the full consumed prologue
    /// before rendering) and panics.
    #[must_use]
    pub fn render(&self, prologue: &[u8], target: Address, continuation: Address) -> Vec<u8>
    {
        let mut bytes = self.code.clone();
        for slot in &self.slots {
            match slot.kind {
                SlotKind::ContinuationAddress => {
                    bytes[slot.offset..slot.offset + 8].copy_from_slice(&continuation.value().to_le_bytes());
                }
                SlotKind::CopiedOriginal { source_offset, len } => {
                    debug_assert!(prologue.len() >= source_offset + len, "prologue too short for copied slot");
                    bytes[slot.offset..slot.offset + len].copy_from_slice(&prologue[source_offset..source_offset + len]);
                }
                SlotKind::RipResolvedAddress {
                    disp_offset,
                    next_instruction_offset,
                } => {
                    debug_assert!(prologue.len() >= disp_offset + 4, "prologue too short for displacement slot");
                    let mut disp_bytes = [0u8; 4];
                    disp_bytes.copy_from_slice(&prologue[disp_offset..disp_offset + 4]);
                    let disp = i32::from_le_bytes(disp_bytes);
                    let resolved = (target + next_instruction_offset as u64).offset(i64::from(disp));
                    bytes[slot.offset..slot.offset + 8].copy_from_slice(&resolved.value().to_le_bytes());
                }
            }
        }
        bytes
    }
}
