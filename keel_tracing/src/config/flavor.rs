use crate::ParseError;
use serde::Deserialize;
use std::str::FromStr;

/// Represents a particular preset of configuration for the
/// [event formatter](tracing_subscriber::fmt::format::Format) used by the
/// console layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum FormatFlavor {
    /// Uses the default [`Full`](tracing_subscriber::fmt::format::Full) event formatting.
    Full,

    /// Uses the [`Compact`](tracing_subscriber::fmt::format::Compact) event formatting.
    Compact,

    /// Uses the multi-line [`Pretty`](tracing_subscriber::fmt::format::Pretty) event formatting.
    Pretty,

    #[cfg(feature = "json")]
    /// Uses the [`Json`](tracing_subscriber::fmt::format::Json) event formatting.
    Json,
}

impl Default for FormatFlavor {
    fn default() -> Self {
        FormatFlavor::Full
    }
}

impl FromStr for FormatFlavor {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" | "default" => Ok(Self::Full),
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            #[cfg(feature = "json")]
            "json" => Ok(Self::Json),
            _ => Err(ParseError::new("format flavor", value)),
        }
    }
}

impl TryFrom<String> for FormatFlavor {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
