use serde::Deserialize;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use tracing_core::LevelFilter as TracingLevelFilter;

/// A thin abstraction around the `tracing` crate’s
/// [`LevelFilter`](TracingLevelFilter), introduced to provide parsing from
/// flags and deserialization from configuration files.
///
/// A verbosity level is “higher” if it is more verbose. In this sense,
/// [`Trace`](Verbosity::Trace) is higher (more verbose) than
/// [`Error`](Verbosity::Error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Verbosity {
    /// Log **nothing**.
    Off,

    /// Log at level [`ERROR`](tracing_core::metadata::Level::ERROR) only.
    Error,

    /// Log at level [`WARN`](tracing_core::metadata::Level::WARN) and lower.
    Warn,

    /// Log at level [`INFO`](tracing_core::metadata::Level::INFO) and lower.
    Info,

    /// Log at level [`DEBUG`](tracing_core::metadata::Level::DEBUG) and lower.
    Debug,

    /// Log **everything**.
    Trace,
}

/// Represents a string that names no known [`Verbosity`] or
/// [`FormatFlavor`](crate::FormatFlavor).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Self::Info
    }
}

impl Verbosity {
    /// Translates this [`Verbosity`] level to the `tracing` crate’s
    /// [`LevelFilter`](TracingLevelFilter).
    pub fn to_tracing_level_filter(&self) -> TracingLevelFilter {
        match self {
            Self::Off => TracingLevelFilter::OFF,
            Self::Error => TracingLevelFilter::ERROR,
            Self::Warn => TracingLevelFilter::WARN,
            Self::Info => TracingLevelFilter::INFO,
            Self::Debug => TracingLevelFilter::DEBUG,
            Self::Trace => TracingLevelFilter::TRACE,
        }
    }

    /// The canonical lower-case name of this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl FromStr for Verbosity {
    type Err = ParseError;

    /// Parses a level name, ignoring case and surrounding whitespace.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" | "no" | "none" => Ok(Self::Off),
            "error" | "err" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(ParseError::new("verbosity", value)),
        }
    }
}

impl TryFrom<String> for Verbosity {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, ParseError> {
        value.parse()
    }
}

impl Display for Verbosity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Verbosity> for TracingLevelFilter {
    fn from(value: Verbosity) -> Self {
        value.to_tracing_level_filter()
    }
}

impl From<&Verbosity> for TracingLevelFilter {
    fn from(value: &Verbosity) -> Self {
        value.to_tracing_level_filter()
    }
}
