#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

/// Exposes the crash-reporting configuration.
mod config;
pub use self::config::SentryConfig;

/// Implements initialization of the Sentry client.
mod integration;
pub use self::integration::SentryIntegration;
pub use sentry::ClientInitGuard as SentryGuard;

/// Implements the component that flushes pending events on shutdown.
mod flush;
pub use self::flush::{SentryFlush, SentrySlot};

/// Implements a customized [`SentryLayer`](sentry_tracing::SentryLayer) that
/// turns alert-marked `tracing` events into Sentry events.
#[cfg(feature = "tracing")]
pub mod tracing;
