use keel_core::{ConstructionError, ServiceError};
use thiserror::Error;

/// Represents the reasons a [`Launchpad`](crate::Launchpad) run may end
/// unsuccessfully.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// The asynchronous runtime could not be built.
    #[error("failed to build the runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// The service could not be constructed.
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    /// A logging flag holds an invalid value.
    #[cfg(feature = "tracing")]
    #[error(transparent)]
    Flag(#[from] keel_core::FlagError),

    /// The log file could not be opened.
    #[error("failed to open the log file: {0}")]
    LogFile(#[source] std::io::Error),

    /// A lifecycle operation of the service failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}
