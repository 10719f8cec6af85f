use crate::LaunchError;
use keel_core::{Directive, Exit, Service};
use std::process::ExitCode;
use tokio::runtime::{Builder, Runtime};

/// Wires logging, crash reporting, and the [`Service`] lifecycle into a single
/// blocking call.
///
/// ## Stages
///
/// 1. **Runtime:** builds a multi-threaded Tokio runtime.
/// 2. **Construction:** constructs the [`Service`] from the directives. With
///    the `tracing` feature, a [`Logger`](crate::Logger) is registered first
///    to declare the logging flags. With the `sentry` feature and a non-empty
///    [DSN](keel_core::with_sentry_dsn), a [`SentryFlush`] component is
///    registered last to flush pending events on shutdown.
/// 3. **Logging:** installs the global `tracing` subscriber: the console layer,
///    a file layer if [file logging](keel_core::with_file_logger) is enabled,
///    and the Sentry alert layer.
/// 4. **Lifecycle:** runs [`init`](Service::init), then
///    [`start`](Service::start), and reports the outcome.
///
/// [`SentryFlush`]: keel_sentry::SentryFlush
pub struct Launchpad {
    directives: Vec<Directive>,
    #[cfg(feature = "sentry")]
    sentry_config: keel_sentry::SentryConfig,
}

impl Launchpad {
    /// Creates a new `Launchpad` for a service built from the given
    /// directives.
    pub fn new(directives: impl IntoIterator<Item = Directive>) -> Self {
        Self {
            directives: directives.into_iter().collect(),
            #[cfg(feature = "sentry")]
            sentry_config: keel_sentry::SentryConfig::default(),
        }
    }

    /// Replaces the default crash-reporting options. The DSN always comes from
    /// the [directive](keel_core::with_sentry_dsn).
    #[cfg(feature = "sentry")]
    pub fn with_sentry_config(self, sentry_config: keel_sentry::SentryConfig) -> Self {
        Self {
            sentry_config,
            ..self
        }
    }
}

impl Launchpad {
    /// Runs the service to completion and maps the outcome to a process exit
    /// code: success on a clean exit, failure on any [`LaunchError`].
    pub fn boot(self) -> ExitCode {
        match self.run() {
            Ok(_) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("{}", error);
                ExitCode::FAILURE
            }
        }
    }

    /// Runs the service to completion on a fresh runtime and reports how it
    /// ended.
    pub fn run(self) -> Result<Exit, LaunchError> {
        let runtime = Self::make_runtime()?;

        runtime.block_on(self.launch())
    }

    fn make_runtime() -> Result<Runtime, LaunchError> {
        Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(LaunchError::Runtime)
    }

    async fn launch(self) -> Result<Exit, LaunchError> {
        #[allow(unused_mut)]
        let mut directives = self.directives;

        #[cfg(feature = "tracing")]
        directives.insert(0, keel_core::with_runnable(crate::Logger::new()));

        #[cfg(feature = "sentry")]
        let sentry_slot = Self::register_sentry(&mut directives);

        let service = Service::try_new(directives)?;

        #[cfg(feature = "tracing")]
        let _log_guard = logging::install(&service)?;

        #[cfg(feature = "sentry")]
        if let (Some(slot), Some(dsn)) = (sentry_slot, service.settings().sentry_dsn()) {
            let config = self.sentry_config.with_dsn(dsn);

            slot.fill(keel_sentry::SentryIntegration::init(
                &config,
                service.env(),
                service.name(),
                service.version(),
            ));
        }

        Self::announce_startup(&service);

        Self::drive(&service).await
    }

    /// Runs the two lifecycle phases. A failed initialization still stops
    /// every component.
    async fn drive(service: &Service) -> Result<Exit, LaunchError> {
        if let Err(error) = service.init().await {
            #[cfg(feature = "tracing")]
            tracing::error!(alert = true, %error, "Failed to initialize service");

            let _ = service.stop().await;

            return Err(error.into());
        }

        let outcome = service.start().await;

        #[cfg(feature = "tracing")]
        match &outcome {
            Ok(exit) => tracing::info!(?exit, "Service exited"),
            Err(error) => tracing::error!(alert = true, %error, "Service failed"),
        }

        Ok(outcome?)
    }

    #[cfg(feature = "sentry")]
    fn register_sentry(directives: &mut Vec<Directive>) -> Option<keel_sentry::SentrySlot> {
        let enabled = directives
            .iter()
            .any(|directive| matches!(directive, Directive::SentryDsn(dsn) if !dsn.is_empty()));

        if !enabled {
            return None;
        }

        let flush = keel_sentry::SentryFlush::new();
        let slot = flush.slot();
        directives.push(keel_core::with_runnable(flush));

        Some(slot)
    }

    fn announce_startup(_service: &Service) {
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Starting {} {} in env '{}'",
            _service.name(),
            _service.version(),
            _service.env(),
        );
    }
}

#[cfg(feature = "tracing")]
mod logging {
    use crate::{LaunchError, Logger};
    use keel_core::Service;
    use keel_tracing::{
        FileLayer, Registry, SubscriberExt, SubscriberInitExt, WorkerGuard, make_file_layer,
        make_layer,
    };

    /// Installs the global subscriber for the given service. Returns the guard
    /// of the file writer, if file logging is enabled.
    pub(super) fn install(service: &Service) -> Result<Option<WorkerGuard>, LaunchError> {
        let config = Logger::tracing_config(service.flags())?;

        let (file_layer, guard) = match service.settings().log_dir() {
            Some(dir) => {
                let FileLayer { layer, guard } =
                    make_file_layer(&config, dir, log_file_name(service.name()))
                        .map_err(LaunchError::LogFile)?;

                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        let subscriber = Registry::default()
            .with(make_layer(&config))
            .with(file_layer);

        #[cfg(feature = "sentry")]
        let subscriber = subscriber.with(keel_sentry::tracing::make_layer());

        // Already installed by an earlier launch in the same process
        let _ = subscriber.try_init();
        let _ = tracing_log::LogTracer::init();

        Ok(guard)
    }

    /// Derives a file name from the service name, keeping only characters that
    /// are safe in file names.
    pub(super) fn log_file_name(service_name: &str) -> String {
        let stem: String = service_name
            .trim()
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
                _ => '-',
            })
            .collect();
        let stem = stem.trim_matches(|c| c == '-' || c == '.');

        if stem.is_empty() {
            "service.log".to_string()
        } else {
            format!("{}.log", stem)
        }
    }

}
