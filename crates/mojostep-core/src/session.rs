//! # Instrumentation Session
//!
//! Bookkeeping for the set of watched modules and the hooks applied to them,
//! plus the notification handlers that drive everything.
//!
//! The session owns all mutable engine state. The host delivers notifications
//! sequentially on its event thread, so the session needs no interior locking;
//! it reacts to each notification, possibly stepping the target for a while,
//! and returns before the next one is processed.
//!
//! Handler failures never propagate to the host. A module whose dispatch
//! function cannot be found, recognized, or patched is logged and skipped;
//! every other watched module keeps working.

use tracing::{debug, error, info, warn};

use mojostep_utils::names::{ensure_dll_extension, strip_file_extension};

use crate::error::{MojostepError, MojostepResult};
use crate::events::HostNotification;
use crate::hooks::{catalog, HookDefinition};
use crate::host::DebugHost;
use crate::stepping::{self, ScanOutcome, DISPATCH_SYMBOL};
use crate::types::{Address, ProcessId};

/// One applied hook: a patched dispatch function in one (process, module).
#[derive(Debug, Clone)]
pub struct HookInstance
{
    /// Process the patch lives in.
    pub process_id: ProcessId,
    /// Normalized name of the patched module.
    pub module_name: String,
    /// Address of the patched dispatch function.
    pub target_address: Address,
    /// Base of the executable scratch allocation holding the trampoline.
    pub trampoline_address: Address,
    /// Granted size of the trampoline allocation in bytes.
    pub trampoline_size: u64,
    /// Address of the `int3` embedded in the trampoline.
    pub breakpoint_address: Address,
    /// Where unpatched execution resumes.
    pub continuation_address: Address,
    /// Catalog variant that matched.
    pub definition_name: &'static str,
    /// Step-overs from the breakpoint back to real function code.
    pub steps_to_exit: u32,
}

/// All engine state for one debugging session.
#[derive(Debug)]
pub struct InstrumentationSession
{
    watched: Vec<String>,
    hooks: Vec<HookInstance>,
    catalog: Vec<HookDefinition>,
}

impl Default for InstrumentationSession
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl InstrumentationSession
{
    /// A session with the built-in variant catalog and nothing watched yet.
    #[must_use]
    pub fn new() -> Self
    {
        Self {
            watched: Vec::new(),
            hooks: Vec::new(),
            catalog: catalog(),
        }
    }

    /// Add a module to the watch list.
    ///
    /// The name is normalized (lowercased, `.dll` appended, any path prefix
    /// dropped) so later load notifications match regardless of how the host
    /// renders the name. Watching an already-watched module is a no-op.
    pub fn watch_module(&mut self, name: &str)
    {
        let normalized = normalized_module_name(name);
        if self.watched.contains(&normalized) {
            return;
        }
        info!("Watching module {normalized}");
        self.watched.push(normalized);
    }

    /// Add several modules to the watch list.
    pub fn watch_modules<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.watch_module(name.as_ref());
        }
    }

    /// Normalized names of the watched modules, in watch order.
    #[must_use]
    pub fn watched_modules(&self) -> &[String]
    {
        &self.watched
    }

    /// Hooks applied so far, in application order.
    #[must_use]
    pub fn hooks(&self) -> &[HookInstance]
    {
        &self.hooks
    }

    /// React to one host notification.
    pub fn handle_notification<H: DebugHost + ?Sized>(&mut self, host: &mut H, notification: &HostNotification)
    {
        debug!("{}", notification.describe());
        match notification {
            HostNotification::ModuleLoaded { name } => self.on_module_loaded(host, name),
            HostNotification::Suspended => self.on_suspended(host),
        }
    }

    /// Handle a module-load notification: patch the module's dispatch
    /// function if the module is watched and not already patched.
    ///
    /// Failures are logged and swallowed; the load notification must never
    /// error back into the host's event loop.
    pub fn on_module_loaded<H: DebugHost + ?Sized>(&mut self, host: &mut H, name: &str)
    {
        if let Err(err) = self.try_hook_module(host, name) {
            match err {
                MojostepError::SymbolNotFound(_) | MojostepError::UnrecognizedFunction { .. } => {
                    warn!("Skipping module {name}: {err}");
                }
                other => error!("Hooking {name} failed: {other}"),
            }
        }
    }

    fn try_hook_module<H: DebugHost + ?Sized>(&mut self, host: &mut H, name: &str) -> MojostepResult<()>
    {
        let module = normalized_module_name(name);
        if !self.watched.contains(&module) {
            return Ok(());
        }

        let process_id = host.current_process_id()?;
        if self
            .hooks
            .iter()
            .any(|hook| hook.process_id == process_id && hook.module_name == module)
        {
            debug!("Module {module} already patched in process {process_id}");
            return Ok(());
        }

        let symbol = format!("{}!{DISPATCH_SYMBOL}", strip_file_extension(&module));
        let target = host.resolve_symbol(&symbol)?;

        let definition = self
            .catalog
            .iter()
            .find(|definition| definition.check_signature(host, target))
            .ok_or_else(|| MojostepError::UnrecognizedFunction {
                module: module.clone(),
            })?;

        let applied = definition.apply(host, target)?;
        info!(
            "Patched {symbol} at {target} in process {process_id} ({}); trampoline at {}",
            definition.name(),
            applied.trampoline.address
        );

        self.hooks.push(HookInstance {
            process_id,
            module_name: module,
            target_address: target,
            trampoline_address: applied.trampoline.address,
            trampoline_size: applied.trampoline.size,
            breakpoint_address: applied.breakpoint_address,
            continuation_address: applied.continuation_address,
            definition_name: definition.name(),
            steps_to_exit: definition.steps_to_exit(),
        });
        Ok(())
    }

    /// Handle a suspension notification.
    ///
    /// Suspensions at an address other than one of our trampoline breakpoints
    /// belong to the user or to other tooling and are ignored. At one of ours,
    /// the stepping engine walks the target into the message handler.
    pub fn on_suspended<H: DebugHost + ?Sized>(&mut self, host: &mut H)
    {
        if let Err(err) = self.try_handle_suspension(host) {
            error!("Stepping sequence failed: {err}");
        }
    }

    fn try_handle_suspension<H: DebugHost + ?Sized>(&mut self, host: &mut H) -> MojostepResult<()>
    {
        let ip = host.instruction_pointer()?;
        let process_id = host.current_process_id()?;

        let Some(hook) = self
            .hooks
            .iter()
            .find(|hook| hook.process_id == process_id && hook.breakpoint_address == ip)
        else {
            return Ok(());
        };

        info!(
            "Marked message arrived at {} hook in {} (process {process_id})",
            hook.definition_name, hook.module_name
        );

        let steps = hook.steps_to_exit;
        stepping::step_out_of_hook(host, steps)?;
        match stepping::run_to_handler(host)? {
            ScanOutcome::HandlerReached => info!("Suspended at the message handler"),
            ScanOutcome::Abandoned => warn!("Handler not reached; target left suspended"),
        }
        Ok(())
    }
}

/// Drop any path prefix, lowercase, and ensure a `.dll` extension.
fn normalized_module_name(name: &str) -> String
{
    let file_name = match name.rfind(['/', '\\']) {
        Some(pos) => &name[pos + 1..],
        None => name,
    };
    ensure_dll_extension(file_name)
}
