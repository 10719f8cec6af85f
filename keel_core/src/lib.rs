#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

/// Capability contract for pluggable components.
mod component;
pub use self::component::{BoxError, Component, Context, Handle, KeyedComponent};

/// Externally configurable parameters declared by components.
mod flags;
pub use self::flags::{Flag, FlagError, FlagSet};

/// Application environment.
mod env;
pub use self::env::AppEnv;

/// Dot-env file loading.
mod dotenv;
pub use self::dotenv::DotEnv;

/// Keyed and background component registry.
mod registry;
pub use self::registry::LookupError;

/// Construction-time configuration directives.
mod directive;
pub use self::directive::{
    Directive, Settings, with_env_file, with_file_logger, with_file_logger_in, with_init_runnable,
    with_name, with_runnable, with_sentry_dsn, with_shutdown_timeout, with_version,
};

/// Termination signals and explicit stop requests.
mod signal;
pub use self::signal::{ShutdownHandle, Signal};

/// Bounded fan-out/fan-in shutdown.
mod shutdown;
pub use self::shutdown::ShutdownTimeout;

/// The orchestrator.
mod service;
pub use self::service::state::ServiceState;
pub use self::service::{APP_ENV_FLAG, Exit, Service};

/// Error types.
mod error;
pub use self::error::{ConstructionError, ServiceError};

/// Re-exports the completion primitives that components hand back from
/// [`Component::stop`].
pub use keel_sync::{Gate, Latch};

/// Re-exports the `async_trait` attribute for implementing [`Component`].
pub use async_trait::async_trait;

/// Globally recognized field name that, when present in a `tracing` macro call,
/// should trigger an event for an external alerting system.
pub const ALERT_FIELD_NAME: &str = "alert";
