#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

/// Implements the [`TracingConfig`] logging configuration.
mod config;
pub use self::config::TracingConfig;
pub use self::config::flavor::FormatFlavor;
pub use self::config::verbosity::{ParseError, Verbosity};

/// Implements the custom formatted console layer.
mod fmt;
pub use self::fmt::make_layer;

/// Implements the file layer.
mod file;
pub use self::file::{FileLayer, make_file_layer};
pub use tracing_appender::non_blocking::WorkerGuard;

/// Partly re-exports the public API of `tracing_*` for convenience.
pub use tracing_core::Subscriber;
pub use tracing_subscriber::Registry;
pub use tracing_subscriber::layer::SubscriberExt;
pub use tracing_subscriber::util::SubscriberInitExt;
