#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

/// Implements the [`Launchpad`] entrypoint.
mod launchpad;
pub use self::launchpad::Launchpad;

/// Implements the [`LaunchError`] type.
mod error;
pub use self::error::LaunchError;

/// Implements the [`Logger`] component.
#[cfg(feature = "tracing")]
mod logger;
#[cfg(feature = "tracing")]
pub use self::logger::{LOG_COLOR_FLAG, LOG_FORMAT_FLAG, LOG_LEVEL_FLAG, Logger};

/// Re-exports the public API of `keel-core` in the root of this crate for
/// convenience.
pub use keel_core::*;

/// Re-exports the public API of `tokio` for convenience.
pub use tokio;

/// Partly re-exports the public API of `tracing` for convenience.
#[cfg(feature = "tracing")]
pub use tracing;

/// Re-exports the public API of `keel-tracing` for convenience.
#[cfg(feature = "tracing")]
pub use keel_tracing as logging;

/// Re-exports the public API of `keel-sentry` for convenience.
#[cfg(feature = "sentry")]
pub use keel_sentry as sentry;
