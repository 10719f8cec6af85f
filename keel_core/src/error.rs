use crate::{BoxError, LookupError, ServiceState, ShutdownTimeout};
use std::path::PathBuf;
use thiserror::Error;

/// Represents the reasons a [`Service`](crate::Service) cannot be constructed.
///
/// All of these are programmer or deployment errors: the process must not
/// start with an ambiguous registry or an unreadable environment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    /// Two keyed components were registered under the same prefix.
    #[error("prefix '{prefix}' is duplicated")]
    DuplicatePrefix {
        /// The duplicated prefix.
        prefix: String,
    },

    /// Two components declared the same flag.
    #[error("flag '{name}' is declared more than once")]
    DuplicateFlag {
        /// The duplicated flag name.
        name: String,
    },

    /// A dot-env file could not be loaded.
    #[error("failed to load env file '{}': {message}", path.display())]
    EnvFile {
        /// The file that failed to load.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },
}

/// Represents the reasons a lifecycle operation of a
/// [`Service`](crate::Service) may fail.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The operation is not allowed in the current state.
    #[error("cannot {operation} a service that is {state}")]
    InvalidState {
        /// The attempted operation.
        operation: &'static str,
        /// The state the service was in.
        state: ServiceState,
    },

    /// A keyed component failed to initialize.
    #[error("failed to initialize component '{prefix}': {source}")]
    Init {
        /// The prefix of the failed component.
        prefix: String,
        /// The component's error.
        #[source]
        source: BoxError,
    },

    /// A background component failed while running.
    #[error("component '{name}' failed: {source}")]
    Component {
        /// The name of the failed component.
        name: String,
        /// The component's error.
        #[source]
        source: BoxError,
    },

    /// A component panicked while initializing or running.
    #[error("component '{name}' panicked: {message}")]
    Panicked {
        /// The name of the failed component.
        name: String,
        /// The panic payload, if it was a string.
        message: String,
    },

    /// A keyed component named for initialization is not registered.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// A function run against the service failed.
    #[error("function failed: {source}")]
    Function {
        /// The function's error.
        #[source]
        source: BoxError,
    },

    /// The OS signal listener could not be installed.
    #[error("failed to listen for termination signals: {0}")]
    Signal(#[source] std::io::Error),

    /// Not all components acknowledged the stop request in time.
    #[error(transparent)]
    ShutdownTimeout(#[from] ShutdownTimeout),
}

impl ServiceError {
    /// Returns the error reported by the failed component, if this error
    /// originates from one.
    pub fn component_error(&self) -> Option<&BoxError> {
        match self {
            Self::Init { source, .. }
            | Self::Component { source, .. }
            | Self::Function { source } => Some(source),
            _ => None,
        }
    }
}
