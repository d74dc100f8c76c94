//! The closed catalog of recognized dispatch-function shapes.
//!
//! Each entry describes one compiled form of
//! `mojo::InterfaceEndpointClient::HandleValidatedMessage` as produced by a
//! known Chromium build configuration, and the trampoline that carries its
//! displaced prologue.
//!
//! The flag check embedded in every trampoline follows the message layout:
//! the second parameter (`rdx`) is the `mojo::Message*`, its payload buffer's
//! `data_` pointer sits at offset `0x18` from the message, and the message
//! header flags are the dword at offset `0x10` from `data_`. Bit 29 of the
//! flags is the step-through marker; only when it is set does execution reach
//! the embedded `int3`.

use super::template::{RelocationSlot, SlotKind, TrampolineTemplate};
use super::{HookDefinition, Signature};

/// Offset of the `int3` inside [`conditional_break_prefix`].
const BREAKPOINT_OFFSET: usize = 31;

/// Both variants displace the same number of prologue bytes.
const CONSUMED_LEN: usize = 17;

/// The flag-checking prefix shared by every trampoline: save scratch
/// registers, follow `message->payload_buffer_.data_`, test bit 29 of the
/// header flags, `int3` when set, restore registers. 42 bytes; the displaced
/// prologue is appended right after.
fn conditional_break_prefix() -> Vec<u8>
{
    vec![
        // Save the registers the check clobbers
        0x50, // push rax
        0x51, // push rcx
        0x52, // push rdx
        0x53, // push rbx
        // Message pointer arrives in rdx (second parameter)
        0x48, 0x89, 0xD0, // mov rax, rdx
        0x48, 0x85, 0xC0, // test rax, rax
        0x74, 0x1A, // jz restore
        // payload_buffer_ is inline at +0x08; data_ at +0x10 within it
        0x48, 0x8B, 0x40, 0x18, // mov rax, [rax+18h]
        0x48, 0x85, 0xC0, // test rax, rax
        0x74, 0x11, // jz restore
        // Header flags are the 5th dword of the payload data
        0x8B, 0x40, 0x10, // mov eax, [rax+10h]
        0x25, 0x00, 0x00, 0x00, 0x20, // and eax, 20000000h (bit 29)
        0x74, 0x07, // jz restore
        0xCC, // int3
        0x90, 0x90, 0x90, 0x90, 0x90, 0x90, // nops for alignment
        // restore:
        0x5B, // pop rbx
        0x5A, // pop rdx
        0x59, // pop rcx
        0x58, // pop rax
    ]
}

/// Release build with no config changes to the bindings component.
///
/// Prologue is a fixed run of pushes plus `sub rsp, 1F0h`, so the signature
/// is an exact byte comparison and the trampoline re-executes the displaced
/// bytes verbatim before jumping back via `rax`.
fn release_default() -> HookDefinition
{
    let signature = Signature::exact(vec![
        0x41, 0x57, // push r15
        0x41, 0x56, // push r14
        0x41, 0x54, // push r12
        0x56, // push rsi
        0x57, // push rdi
        0x55, // push rbp
        0x53, // push rbx
        0x48, 0x81, 0xEC, 0xF0, 0x01, 0x00, 0x00, // sub rsp, 1F0h
    ]);

    let mut code = conditional_break_prefix();
    let prologue_offset = code.len(); // 42
    code.resize(code.len() + CONSUMED_LEN, 0x90); // displaced prologue slot
    let continuation_offset = code.len() + 2; // past the mov opcode
    code.extend_from_slice(&[
        0x48, 0xB8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // mov rax, imm64
        0xFF, 0xE0, // jmp rax
    ]);

    let template = TrampolineTemplate::new(
        code,
        vec![
            RelocationSlot {
                offset: prologue_offset,
                kind: SlotKind::CopiedOriginal {
                    source_offset: 0,
                    len: CONSUMED_LEN,
                },
            },
            RelocationSlot {
                offset: continuation_offset,
                kind: SlotKind::ContinuationAddress,
            },
        ],
    );

    HookDefinition::new("release-default", signature, template, CONSUMED_LEN, BREAKPOINT_OFFSET, 21)
}

/// Release build with the bindings component configured `no_optimize`.
///
/// Prologue is `sub rsp, imm32` / `mov rax, [rip+disp]` (the stack-protector
/// cookie) / `xor rax, rsp`. The frame-size immediate and the cookie
/// displacement vary between builds, so both are wildcard regions. The
/// trampoline re-executes the `sub rsp` verbatim and rewrites the
/// rip-relative cookie load as an absolute one, resolved from the displaced
/// bytes at patch time.
fn release_no_optimize() -> HookDefinition
{
    let signature = Signature::with_wildcards(
        vec![
            0x48, 0x81, 0xEC, 0x00, 0x00, 0x00, 0x00, // sub rsp, imm32
            0x48, 0x8B, 0x05, 0x00, 0x00, 0x00, 0x00, // mov rax, [rip+disp32]
            0x48, 0x31, 0xE0, // xor rax, rsp
        ],
        vec![3..7, 10..14],
    );

    let mut code = conditional_break_prefix();
    let sub_rsp_offset = code.len(); // 42
    code.resize(code.len() + 7, 0x90); // sub rsp, imm32 copied at render time
    let cookie_offset = code.len() + 2;
    code.extend_from_slice(&[
        0x48, 0xB8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // mov rax, imm64 (cookie address)
        0x48, 0x8B, 0x00, // mov rax, [rax]
        0x48, 0x31, 0xE0, // xor rax, rsp
    ]);
    let continuation_offset = code.len() + 2;
    // Jump back through r11: rax holds the cookie check value immediately
    // after the copied instructions and must not be clobbered.
    code.extend_from_slice(&[
        0x49, 0xBB, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // mov r11, imm64
        0x41, 0xFF, 0xE3, // jmp r11
    ]);

    let template = TrampolineTemplate::new(
        code,
        vec![
            RelocationSlot {
                offset: sub_rsp_offset,
                kind: SlotKind::CopiedOriginal {
                    source_offset: 0,
                    len: 7,
                },
            },
            RelocationSlot {
                offset: cookie_offset,
                kind: SlotKind::RipResolvedAddress {
                    disp_offset: 10,
                    next_instruction_offset: 14,
                },
            },
            RelocationSlot {
                offset: continuation_offset,
                kind: SlotKind::ContinuationAddress,
            },
        ],
    );

    HookDefinition::new("release-no-optimize", signature, template, CONSUMED_LEN, BREAKPOINT_OFFSET, 17)
}

/// All known variants, in the order signatures are probed.
#[must_use]
pub fn catalog() -> Vec<HookDefinition>
{
    vec![release_default(), release_no_optimize()]
}
