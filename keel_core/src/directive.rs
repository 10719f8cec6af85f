use crate::{Component, KeyedComponent};
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::time::Duration;

/// Default bound on how long the service waits for components to acknowledge a
/// stop request.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Default directory for the file logger.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// A single configuration directive, applied in order when a
/// [`Service`](crate::Service) is constructed.
///
/// Directives are usually produced by the `with_*` helper functions of this
/// crate rather than spelled out.
pub enum Directive {
    /// Sets the service name.
    Name(String),

    /// Sets the service version.
    Version(String),

    /// Registers a background component, run concurrently for the whole
    /// service lifetime.
    Runnable(Box<dyn Component>),

    /// Registers a keyed component, run sequentially during
    /// [`init`](crate::Service::init).
    InitRunnable(Box<dyn KeyedComponent>),

    /// Enables crash reporting to the given DSN.
    SentryDsn(String),

    /// Enables writing log entries to files in the given directory.
    FileLogger(PathBuf),

    /// Bounds the shutdown wait.
    ShutdownTimeout(Duration),

    /// Names an explicit dot-env file that must be loaded.
    EnvFile(PathBuf),
}

impl Debug for Directive {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Version(version) => f.debug_tuple("Version").field(version).finish(),
            Self::Runnable(component) => f.debug_tuple("Runnable").field(&component.name()).finish(),
            Self::InitRunnable(component) => f
                .debug_tuple("InitRunnable")
                .field(&component.prefix())
                .finish(),
            Self::SentryDsn(_) => f.debug_tuple("SentryDsn").field(&"<redacted>").finish(),
            Self::FileLogger(dir) => f.debug_tuple("FileLogger").field(dir).finish(),
            Self::ShutdownTimeout(timeout) => {
                f.debug_tuple("ShutdownTimeout").field(timeout).finish()
            }
            Self::EnvFile(path) => f.debug_tuple("EnvFile").field(path).finish(),
        }
    }
}

/// Service-level settings accumulated from [`Directive`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    name: String,
    version: String,
    sentry_dsn: Option<String>,
    log_dir: Option<PathBuf>,
    shutdown_timeout: Duration,
    env_file: Option<PathBuf>,
}

impl Settings {
    /// The service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The service version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The crash-reporting DSN, if crash reporting is enabled.
    pub fn sentry_dsn(&self) -> Option<&str> {
        self.sentry_dsn.as_deref()
    }

    /// The file logger directory, if file logging is enabled.
    pub fn log_dir(&self) -> Option<&PathBuf> {
        self.log_dir.as_ref()
    }

    /// The bound on the shutdown wait.
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// The explicit dot-env file, if one was named.
    pub fn env_file(&self) -> Option<&PathBuf> {
        self.env_file.as_ref()
    }

    /// Applies a settings directive. Component registrations are handled by
    /// the service and ignored here.
    pub(crate) fn apply(&mut self, directive: &Directive) {
        match directive {
            Directive::Name(name) => self.name = name.clone(),
            Directive::Version(version) => self.version = version.clone(),
            Directive::SentryDsn(dsn) => self.sentry_dsn = (!dsn.is_empty()).then(|| dsn.clone()),
            Directive::FileLogger(dir) => self.log_dir = Some(dir.clone()),
            Directive::ShutdownTimeout(timeout) => self.shutdown_timeout = *timeout,
            Directive::EnvFile(path) => self.env_file = Some(path.clone()),
            Directive::Runnable(_) | Directive::InitRunnable(_) => {}
        }
    }

    /// Falls back on the process arguments for the name: the first two joined
    /// with a space.
    pub(crate) fn default_name_from_args(&mut self) {
        if self.name.is_empty() {
            self.name = std::env::args().take(2).collect::<Vec<_>>().join(" ");
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            sentry_dsn: None,
            log_dir: None,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            env_file: None,
        }
    }
}

/// Sets the service name, used for logging and crash reporting.
pub fn with_name(name: impl Into<String>) -> Directive {
    Directive::Name(name.into())
}

/// Sets the service version. Every deployment needs one.
pub fn with_version(version: impl Into<String>) -> Directive {
    Directive::Version(version.into())
}

/// Registers a background component. Background components are run
/// concurrently when the service starts.
pub fn with_runnable<C>(component: C) -> Directive
where
    C: Component,
{
    Directive::Runnable(Box::new(component))
}

/// Registers a keyed component. Keyed components are run sequentially, in
/// registration order, before the service starts.
///
/// A duplicate prefix aborts the service construction.
pub fn with_init_runnable<C>(component: C) -> Directive
where
    C: KeyedComponent,
{
    Directive::InitRunnable(Box::new(component))
}

/// Enables crash reporting to the given DSN. An empty DSN is ignored.
pub fn with_sentry_dsn(dsn: impl Into<String>) -> Directive {
    Directive::SentryDsn(dsn.into())
}

/// Enables writing log entries to files in the default `logs` directory.
pub fn with_file_logger() -> Directive {
    Directive::FileLogger(PathBuf::from(DEFAULT_LOG_DIR))
}

/// Enables writing log entries to files in the given directory.
pub fn with_file_logger_in(dir: impl Into<PathBuf>) -> Directive {
    Directive::FileLogger(dir.into())
}

/// Bounds how long the service waits for components to acknowledge a stop
/// request.
pub fn with_shutdown_timeout(timeout: Duration) -> Directive {
    Directive::ShutdownTimeout(timeout)
}

/// Names an explicit dot-env file to load before flags are resolved. The file
/// must exist.
pub fn with_env_file(path: impl Into<PathBuf>) -> Directive {
    Directive::EnvFile(path.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn later_directives_win() {
        // Given
        let mut settings = Settings::default();
        let directives = [
            with_name("first"),
            with_version("1.0.0"),
            with_name("second"),
            with_shutdown_timeout(Duration::from_secs(3)),
            with_file_logger(),
        ];

        // When
        for directive in &directives {
            settings.apply(directive);
        }

        // Then
        assert_eq!(settings.name(), "second");
        assert_eq!(settings.version(), "1.0.0");
        assert_eq!(settings.shutdown_timeout(), Duration::from_secs(3));
        assert_eq!(settings.log_dir(), Some(&PathBuf::from("logs")));
        assert_eq!(settings.sentry_dsn(), None);
    }

    #[test]
    fn redacted_debug() {
        let directive = with_sentry_dsn("https://key@sentry.example.com/1");

        assert_eq!(format!("{:?}", directive), "SentryDsn(\"<redacted>\")");
    }
}
