//! Debugger focus restoration.
//!
//! Every step releases the whole target, and Chromium's other threads and
//! processes keep generating events while it runs. By the time the debugger
//! suspends again its notion of "current process/thread" may have drifted to
//! wherever the last event landed. A [`ContextGuard`] captures the focus at
//! the start of a stepping sequence and pulls it back after each step, so
//! stack and source queries keep reading the thread actually being stepped.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::MojostepResult;
use crate::host::DebugHost;
use crate::types::{ProcessId, ThreadId};

/// How long to wait for the host to settle after a focus re-selection.
const RESELECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Captured debugger focus: the (process, thread) a stepping sequence is
/// anchored to.
#[derive(Debug, Clone, Copy)]
pub struct ContextGuard
{
    process: ProcessId,
    thread: ThreadId,
}

impl ContextGuard
{
    /// Capture the host's current focus.
    ///
    /// ## Errors
    ///
    /// Whatever the host's process/thread queries surface.
    pub fn capture<H: DebugHost + ?Sized>(host: &mut H) -> MojostepResult<Self>
    {
        Ok(Self {
            process: host.current_process_id()?,
            thread: host.current_thread_id()?,
        })
    }

    /// Process this guard is anchored to.
    #[must_use]
    pub fn process(&self) -> ProcessId
    {
        self.process
    }

    /// Thread this guard is anchored to.
    #[must_use]
    pub fn thread(&self) -> ThreadId
    {
        self.thread
    }

    /// Pull the host's focus back to the captured (process, thread) if it
    /// drifted. Returns `true` when focus matches on exit.
    ///
    /// Focus that is already correct is left untouched. Drift in either
    /// component triggers one process re-select and one thread re-select,
    /// each followed by a settle wait: re-selecting a process lands on that
    /// process's default thread, so the thread must be pinned again even when
    /// only the process moved. A re-selection that does not stick (concurrent
    /// events keep moving it) is reported with `false` rather than an error;
    /// the caller decides whether to abort.
    ///
    /// ## Errors
    ///
    /// Host query/selection failures other than plain drift.
    pub fn restore_if_changed<H: DebugHost + ?Sized>(&self, host: &mut H) -> MojostepResult<bool>
    {
        let process_now = host.current_process_id()?;
        let thread_now = host.current_thread_id()?;
        if process_now == self.process && thread_now == self.thread {
            return Ok(true);
        }

        debug!(
            "Focus drifted to process {process_now}, thread {thread_now}; restoring process {}, thread {}",
            self.process, self.thread
        );

        host.set_current_process(self.process)?;
        host.wait_for_suspend(RESELECT_TIMEOUT)?;
        host.set_current_thread(self.thread)?;
        host.wait_for_suspend(RESELECT_TIMEOUT)?;

        let restored = host.current_process_id()? == self.process && host.current_thread_id()? == self.thread;
        if !restored {
            warn!(
                "Focus could not be restored to process {}, thread {}",
                self.process, self.thread
            );
        }
        Ok(restored)
    }
}
