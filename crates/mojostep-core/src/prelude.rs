//! Common module for library exports

pub use crate::context::ContextGuard;
pub use crate::error::{MojostepError, MojostepResult};
pub use crate::events::HostNotification;
pub use crate::hooks::{catalog, AppliedPatch, HookDefinition, Signature};
pub use crate::host::{DebugHost, ExecutionMode};
pub use crate::session::{HookInstance, InstrumentationSession};
pub use crate::stepping::{run_to_handler, step_into_message_and_set_flag, ScanOutcome, StepDecision};
pub use crate::types::address::Address;
pub use crate::types::{ProcessId, ScratchAllocation, SourceInfo, ThreadId};
