use std::fmt::{Display, Formatter};

/// The lifecycle state of a [`Service`](crate::Service).
///
/// ```text
/// Constructed --init()--> Initializing --(all keyed ready)--> Initialized
///   --start()--> Running --(fatal error | signal | stop request)--> Stopping
///   --(all acknowledged or timed out)--> Stopped
/// ```
///
/// A failed [`init`](crate::Service::init) leaves the service in
/// [`Initializing`](ServiceState::Initializing), from which only
/// [`stop`](crate::Service::stop) is allowed. [`Stopped`](ServiceState::Stopped)
/// is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceState {
    /// Components are registered; nothing has run yet.
    Constructed,
    /// Keyed components are being (or failed being) initialized.
    Initializing,
    /// All keyed components are initialized.
    Initialized,
    /// Background components are running.
    Running,
    /// Components are being asked to stop.
    Stopping,
    /// All components acknowledged their stop request or timed out.
    Stopped,
}

impl ServiceState {
    /// Reports whether the service is past the point of accepting a new stop.
    pub fn is_stopping_or_stopped(&self) -> bool {
        matches!(self, Self::Stopping | Self::Stopped)
    }
}

impl Display for ServiceState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Constructed => "constructed",
            Self::Initializing => "initializing",
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        })
    }
}
