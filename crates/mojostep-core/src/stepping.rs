//! # Stepping Engine
//!
//! Walks the target from a trampoline breakpoint to the generated message
//! handler, one step at a time.
//!
//! The walk is a loop over suspensions: inspect the top of the call stack,
//! classify it, pick the next step kind, release, wait, restore focus, repeat.
//! Classification is a pure function ([`decide`]) over the stack window and
//! the current source line, so the whole policy is unit-testable without a
//! live target.

use std::time::Duration;

use tracing::{debug, info, warn};

use mojostep_utils::names::contains_ci;

use crate::context::ContextGuard;
use crate::error::{MojostepError, MojostepResult};
use crate::host::{DebugHost, ExecutionMode};
use crate::types::SourceInfo;

/// The mojo-core entry point every in-flight message passes through.
pub const DISPATCH_SYMBOL: &str = "mojo::InterfaceEndpointClient::HandleValidatedMessage";

/// Stack frames above the deepest anchor before the walk gives up.
pub const MAX_FRAME_DEPTH: usize = 6;

/// Upper bound on scan iterations; a runaway walk stops here.
pub const MAX_SCAN_ITERATIONS: u32 = 200;

/// How long each step waits for the target to suspend again.
const SUSPEND_TIMEOUT: Duration = Duration::from_secs(20);

/// Attempts to land inside the `mojo::Message` constructor during the manual
/// trigger before giving up.
const MAX_CONSTRUCTOR_ATTEMPTS: u32 = 5;

/// Parameter names of the `mojo::Message` constructor overload whose frame
/// carries the header flags, in declaration order.
const MESSAGE_CONSTRUCTOR_PARAMS: [&str; 7] = [
    "name",
    "flags",
    "payload_size",
    "payload_interface_id_count",
    "create_message_flags",
    "handles",
    "estimated_payload_size",
];

/// What the scan loop should do at one suspension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDecision
{
    /// Release the target with the given step kind and look again.
    Step(ExecutionMode),
    /// The handler has been reached; leave the target suspended here.
    Found,
    /// Execution wandered too far from the dispatch path; give up.
    Abandon,
}

/// Terminal result of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome
{
    /// Suspended inside the generated handler's `.mojom.cc` dispatch code.
    HandlerReached,
    /// The walk gave up without finding the handler.
    Abandoned,
}

fn is_anchor_frame(frame: &str) -> bool
{
    frame.ends_with(DISPATCH_SYMBOL) || is_accept_frame(frame)
}

fn is_accept_frame(frame: &str) -> bool
{
    frame.ends_with("::Accept") || frame.ends_with("::AcceptWithResponder")
}

/// Classify one suspension from the top stack window and the current source.
///
/// `frames` is most-recent first, at most [`MAX_FRAME_DEPTH`] entries. The
/// handler is recognized by an `Accept` frame on top with line information in
/// a generated `.mojom.cc` file. Otherwise the distance from the top to the
/// nearest anchor frame picks the step kind: on the anchor itself step into,
/// one frame above step over to drain the detour, deeper than that step out
/// until the anchor is back on top. When a stack shorter than the window
/// carries no anchor, the anchor sits below the frames the host returned and
/// the stack length stands in as the depth; only a full window with no anchor
/// means the walk has escaped the dispatch path entirely.
#[must_use]
pub fn decide(frames: &[String], source: Option<&SourceInfo>) -> StepDecision
{
    if let Some(top) = frames.first() {
        if is_accept_frame(top) && source.is_some_and(|s| s.file_name_ends_with(".mojom.cc")) {
            return StepDecision::Found;
        }
    }

    let depth = frames
        .iter()
        .take(MAX_FRAME_DEPTH)
        .position(|frame| is_anchor_frame(frame));

    match depth {
        Some(0) => StepDecision::Step(ExecutionMode::StepInto),
        Some(1) => StepDecision::Step(ExecutionMode::StepOver),
        Some(_) => StepDecision::Step(ExecutionMode::StepOut),
        None if frames.is_empty() || frames.len() >= MAX_FRAME_DEPTH => StepDecision::Abandon,
        None if frames.len() == 1 => StepDecision::Step(ExecutionMode::StepOver),
        None => StepDecision::Step(ExecutionMode::StepOut),
    }
}

fn step_and_resettle<H: DebugHost + ?Sized>(
    host: &mut H,
    guard: &ContextGuard,
    mode: ExecutionMode,
) -> MojostepResult<()>
{
    host.set_execution_mode(mode)?;
    host.wait_for_suspend(SUSPEND_TIMEOUT)?;
    if !guard.restore_if_changed(host)? {
        return Err(MojostepError::FocusNotRestored {
            process: guard.process(),
            thread: guard.thread(),
        });
    }
    Ok(())
}

/// Walk from the trampoline breakpoint into the generated message handler.
///
/// Called with the target suspended at the embedded `int3`. On
/// [`ScanOutcome::HandlerReached`] the target is left suspended at the first
/// line of the handler's dispatch code; on [`ScanOutcome::Abandoned`] the
/// target is left suspended wherever the walk stopped.
///
/// ## Errors
///
/// Host failures during stepping, or `FocusNotRestored` when debugger focus
/// cannot be pulled back between steps.
pub fn run_to_handler<H: DebugHost + ?Sized>(host: &mut H) -> MojostepResult<ScanOutcome>
{
    let guard = ContextGuard::capture(host)?;

    for iteration in 0..MAX_SCAN_ITERATIONS {
        let frames = host.call_stack(MAX_FRAME_DEPTH, false)?;
        let source = host.current_source()?;

        match decide(&frames, source.as_ref()) {
            StepDecision::Found => {
                info!("Reached message handler after {iteration} steps");
                return Ok(ScanOutcome::HandlerReached);
            }
            StepDecision::Abandon => {
                warn!("Lost the dispatch path after {iteration} steps; leaving target suspended");
                return Ok(ScanOutcome::Abandoned);
            }
            StepDecision::Step(mode) => {
                debug!("Scan iteration {iteration}: {mode:?}");
                step_and_resettle(host, &guard, mode)?;
            }
        }
    }

    warn!("Scan did not converge within {MAX_SCAN_ITERATIONS} iterations");
    Ok(ScanOutcome::Abandoned)
}

/// Step over the tail of the trampoline so the walk starts from real function
/// code.
///
/// The breakpoint sits before the register restores and the displaced
/// prologue; `steps` is the fixed per-variant count of instructions from the
/// `int3` back to the original function body.
///
/// ## Errors
///
/// Host failures during stepping, or `FocusNotRestored`.
pub fn step_out_of_hook<H: DebugHost + ?Sized>(host: &mut H, steps: u32) -> MojostepResult<()>
{
    let guard = ContextGuard::capture(host)?;
    for _ in 0..steps {
        step_and_resettle(host, &guard, ExecutionMode::StepOver)?;
    }
    Ok(())
}

fn frame_is_flag_constructor(frame: &str) -> bool
{
    if !contains_ci(frame, "Message::Message") {
        return false;
    }
    // Overloads are told apart by the rendered parameter list; the one that
    // takes the header flags lists these names in order.
    let mut rest = frame;
    for param in MESSAGE_CONSTRUCTOR_PARAMS {
        match rest.find(param) {
            Some(pos) => rest = &rest[pos + param.len()..],
            None => return false,
        }
    }
    true
}

/// Manual trigger: from a breakpoint inside generated serialization code, step
/// into the `mojo::Message` constructor and set the step-through bit on the
/// message being built.
///
/// Requires the target to be suspended with line information in a `.mojom.cc`
/// file. After flipping the bit the target is resumed; the patched dispatch
/// function picks the message up when it arrives on the receiving side.
///
/// Returns `false` when the constructor was not reached (wrong suspension
/// point, or the right overload never appeared); the target is left wherever
/// the attempts ended.
///
/// ## Errors
///
/// Host failures during stepping or evaluation, or `FocusNotRestored`.
pub fn step_into_message_and_set_flag<H: DebugHost + ?Sized>(host: &mut H) -> MojostepResult<bool>
{
    let source = host.current_source()?;
    if !source.is_some_and(|s| s.file_name_ends_with(".mojom.cc")) {
        warn!("Not suspended in generated serialization code; refusing to step");
        return Ok(false);
    }

    let guard = ContextGuard::capture(host)?;
    step_and_resettle(host, &guard, ExecutionMode::StepInto)?;

    let mut in_constructor = false;
    for attempt in 0..MAX_CONSTRUCTOR_ATTEMPTS {
        let frames = host.call_stack(5, true)?;
        if frames.first().is_some_and(|top| frame_is_flag_constructor(top)) {
            debug!("Landed in the message constructor after {attempt} extra steps");
            in_constructor = true;
            break;
        }
        step_and_resettle(host, &guard, ExecutionMode::StepInto)?;
    }

    if !in_constructor {
        warn!("Could not reach the flag-carrying message constructor");
        return Ok(false);
    }

    // One step past the prologue so `flags` is initialized before we touch it.
    step_and_resettle(host, &guard, ExecutionMode::StepOver)?;
    let result = host.evaluate("flags = flags | (1 << 29)")?;
    info!("Marked in-flight message for step-through: {result}");

    host.set_execution_mode(ExecutionMode::Continue)?;
    Ok(true)
}
