use secure_string::SecureString;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Represents the crash-reporting configuration.
///
/// Deserializes either from a bare string, taken as the DSN, or from a map of
/// the individual options. Durations are written in human-friendly form
/// (e.g., `1s 500ms`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawSentryConfig")]
pub struct SentryConfig {
    dsn: SecureString,
    debug: bool,
    sample_rate: f32,
    traces_sample_rate: f32,
    max_breadcrumbs: usize,
    attach_stacktrace: bool,
    shutdown_timeout: Duration,
}

impl SentryConfig {
    /// Creates a default configuration reporting to the given DSN.
    pub fn from_dsn(dsn: impl Into<String>) -> Self {
        Self {
            dsn: SecureString::from(dsn.into()),
            ..Self::default()
        }
    }

    /// Replaces the DSN, keeping all other options.
    pub fn with_dsn(self, dsn: impl Into<String>) -> Self {
        Self {
            dsn: SecureString::from(dsn.into()),
            ..self
        }
    }

    /// Returns the DSN (Data Source Name): where to send crash reports.
    pub fn dsn(&self) -> &SecureString {
        &self.dsn
    }

    /// Reports whether the Sentry client logs its own operations.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Returns the share of error events to report, from 0.0 to 1.0.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Returns the share of transaction traces to report, from 0.0 to 1.0.
    pub fn traces_sample_rate(&self) -> f32 {
        self.traces_sample_rate
    }

    /// Returns the maximum number of breadcrumbs retained per event.
    pub fn max_breadcrumbs(&self) -> usize {
        self.max_breadcrumbs
    }

    /// Reports whether stack traces are attached to all events.
    pub fn attach_stacktrace(&self) -> bool {
        self.attach_stacktrace
    }

    /// Returns how long flushing pending events may take on shutdown.
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: SecureString::from(""),
            debug: false,
            sample_rate: 1.0,
            traces_sample_rate: 0.0,
            max_breadcrumbs: 64,
            attach_stacktrace: false,
            shutdown_timeout: Duration::from_secs(2),
        }
    }
}

impl AsRef<SentryConfig> for SentryConfig {
    fn as_ref(&self) -> &SentryConfig {
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSentryConfig {
    Dsn(String),
    Map(SentryConfigFields),
}

#[derive(Deserialize)]
#[serde(default)]
struct SentryConfigFields {
    dsn: Option<SecureString>,
    debug: bool,
    sample_rate: f32,
    traces_sample_rate: f32,
    #[serde(alias = "breadcrumbs")]
    max_breadcrumbs: usize,
    #[serde(alias = "stacktrace")]
    attach_stacktrace: bool,
    #[serde(deserialize_with = "human_duration")]
    shutdown_timeout: Duration,
}

impl Default for SentryConfigFields {
    fn default() -> Self {
        let defaults = SentryConfig::default();

        Self {
            dsn: None,
            debug: defaults.debug,
            sample_rate: defaults.sample_rate,
            traces_sample_rate: defaults.traces_sample_rate,
            max_breadcrumbs: defaults.max_breadcrumbs,
            attach_stacktrace: defaults.attach_stacktrace,
            shutdown_timeout: defaults.shutdown_timeout,
        }
    }
}

impl From<RawSentryConfig> for SentryConfig {
    fn from(raw: RawSentryConfig) -> Self {
        match raw {
            RawSentryConfig::Dsn(dsn) => Self::from_dsn(dsn),
            RawSentryConfig::Map(fields) => Self {
                dsn: fields.dsn.unwrap_or_else(|| SecureString::from("")),
                debug: fields.debug,
                sample_rate: fields.sample_rate,
                traces_sample_rate: fields.traces_sample_rate,
                max_breadcrumbs: fields.max_breadcrumbs,
                attach_stacktrace: fields.attach_stacktrace,
                shutdown_timeout: fields.shutdown_timeout,
            },
        }
    }
}

fn human_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;

    humantime::parse_duration(&value).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use crate::SentryConfig;
    use pretty_assertions::assert_eq;
    use secure_string::SecureString;
    use std::time::Duration;

    #[test]
    fn from_empty() {
        // Given
        let input = "{}";
        let expected_output = SentryConfig::default();

        // When
        let actual_output = serde_yml::from_str::<SentryConfig>(input).unwrap();

        // Then
        assert_eq!(expected_output, actual_output);
    }

    #[test]
    fn from_string() {
        // Given
        let input = "some_dsn";
        let expected_output = SentryConfig::from_dsn("some_dsn");

        // When
        let actual_output = serde_yml::from_str::<SentryConfig>(input).unwrap();

        // Then
        assert_eq!(expected_output, actual_output);
    }

    #[test]
    fn from_map_full() {
        // Given
        let input = r#"
dsn: some_dsn
debug: true
sample_rate: 0.5
traces_sample_rate: 0.25
breadcrumbs: 50
attach_stacktrace: true
shutdown_timeout: 1s 500ms
"#;
        let expected_output = SentryConfig {
            dsn: SecureString::from("some_dsn"),
            debug: true,
            sample_rate: 0.5,
            traces_sample_rate: 0.25,
            max_breadcrumbs: 50,
            attach_stacktrace: true,
            shutdown_timeout: Duration::from_millis(1500),
        };

        // When
        let actual_output = serde_yml::from_str::<SentryConfig>(input).unwrap();

        // Then
        assert_eq!(expected_output, actual_output);
    }

    #[test]
    fn invalid_duration() {
        // Given
        let input = "shutdown_timeout: soon";

        // When
        let result = serde_yml::from_str::<SentryConfig>(input);

        // Then
        assert!(result.is_err());
    }
}
