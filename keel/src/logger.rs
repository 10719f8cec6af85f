use keel_core::{BoxError, Component, Context, FlagSet, Gate, Latch, async_trait};
use keel_tracing::{FormatFlavor, TracingConfig, Verbosity};

/// Flag selecting the root log [verbosity](Verbosity).
pub const LOG_LEVEL_FLAG: &str = "log-level";

/// Flag selecting the console log [format](FormatFlavor).
pub const LOG_FORMAT_FLAG: &str = "log-format";

/// Flag enabling colored console output.
pub const LOG_COLOR_FLAG: &str = "log-color";

/// A background component that declares the logging flags of the service.
///
/// The subscriber itself is installed by the [`Launchpad`](crate::Launchpad)
/// once the flags are resolved: see [`Logger::tracing_config`].
pub struct Logger {
    stopped: Latch,
}

impl Logger {
    /// Creates the component.
    pub fn new() -> Self {
        Self {
            stopped: Latch::new(),
        }
    }

    /// Builds the [`TracingConfig`] from the resolved logging flags. Flags that
    /// were never declared keep their default values.
    pub fn tracing_config(flags: &FlagSet) -> Result<TracingConfig, keel_core::FlagError> {
        let mut config = TracingConfig::default();

        if let Some(flag) = flags.get(LOG_LEVEL_FLAG) {
            config = config.with_verbosity(flag.parse::<Verbosity>()?);
        }

        if let Some(flag) = flags.get(LOG_FORMAT_FLAG) {
            config = config.with_flavor(flag.parse::<FormatFlavor>()?);
        }

        if let Some(flag) = flags.get(LOG_COLOR_FLAG) {
            config = config.with_color(flag.parse::<bool>()?);
        }

        Ok(config)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Component for Logger {
    fn name(&self) -> &str {
        "logger"
    }

    fn init_flags(&mut self, flags: &mut FlagSet) {
        flags.declare(
            LOG_LEVEL_FLAG,
            Verbosity::default().as_str(),
            "Log level. Ex: trace | debug | info | warn | error | off",
        );
        flags.declare(LOG_FORMAT_FLAG, "full", "Log format. Ex: full | compact | pretty");
        flags.declare(LOG_COLOR_FLAG, "true", "Colored console log output");
    }

    async fn run(&self, _ctx: &Context) -> Result<(), BoxError> {
        self.stopped.gate().opened().await;

        Ok(())
    }

    fn stop(&self) -> Gate {
        self.stopped.release();

        Gate::ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn declared() -> FlagSet {
        let mut flags = FlagSet::new();
        Logger::new().init_flags(&mut flags);

        flags
    }

    #[test]
    fn defaults() {
        // Given
        let flags = declared();

        // When
        let config = Logger::tracing_config(&flags).unwrap();

        // Then
        assert_eq!(config, TracingConfig::default());
    }

    #[test]
    fn resolved() {
        // Given
        let flags = declared();
        flags.parse_with(|name| match name {
            "LOG_LEVEL" => Some("debug".to_string()),
            "LOG_FORMAT" => Some("compact".to_string()),
            "LOG_COLOR" => Some("false".to_string()),
            _ => None,
        });

        // When
        let config = Logger::tracing_config(&flags).unwrap();

        // Then
        assert_eq!(config.verbosity(), Verbosity::Debug);
        assert_eq!(config.flavor(), FormatFlavor::Compact);
        assert!(!config.color());
    }

    #[test]
    fn invalid_level() {
        // Given
        let flags = declared();
        flags.parse_with(|name| (name == "LOG_LEVEL").then(|| "chatty".to_string()));

        // When
        let error = Logger::tracing_config(&flags).unwrap_err();

        // Then
        assert_eq!(
            error.to_string(),
            "invalid value 'chatty' for flag 'log-level': unknown verbosity 'chatty'",
        );
    }
}
