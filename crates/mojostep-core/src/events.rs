//! Host notification types and helpers.
//!
//! The host debugger drives the engine with notifications: one per module the
//! debuggee maps in, one per suspension. The engine never polls; everything it
//! does is a reaction to one of these, delivered sequentially on the host's
//! event thread.

/// Notification delivered by the host debugger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostNotification
{
    /// The debuggee mapped a module into its address space.
    ModuleLoaded
    {
        /// Module name or path as the host reports it.
        name: String,
    },
    /// The debuggee suspended (breakpoint, exception, step completion).
    Suspended,
}

impl HostNotification
{
    /// Human-readable description of the notification.
    #[must_use]
    pub fn describe(&self) -> String
    {
        match self {
            Self::ModuleLoaded { name } => format!("Module loaded: {name}"),
            Self::Suspended => "Target suspended".to_string(),
        }
    }
}
