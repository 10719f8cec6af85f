use crate::{SentryConfig, SentryFlush};
use keel_core::AppEnv;
use sentry::ClientInitGuard as SentryGuard;
use std::borrow::Cow;

/// A facade for integrating with Sentry.
pub struct SentryIntegration;

impl SentryIntegration {
    /// Initializes the Sentry client and returns its [guard](SentryGuard).
    ///
    /// Events are tagged with the given environment, and the release is
    /// derived from the service name and version. An empty DSN leaves the
    /// client disabled.
    pub fn init(
        config: impl AsRef<SentryConfig>,
        env: &AppEnv,
        name: &str,
        version: &str,
    ) -> SentryGuard {
        let config = config.as_ref();

        let guard = sentry::init((
            config.dsn().unsecure(),
            sentry::ClientOptions {
                debug: config.debug(),
                release: Self::release(name, version),
                environment: Some(Cow::Owned(env.as_str().to_string())),
                sample_rate: config.sample_rate(),
                traces_sample_rate: config.traces_sample_rate(),
                max_breadcrumbs: config.max_breadcrumbs(),
                attach_stacktrace: config.attach_stacktrace(),
                shutdown_timeout: config.shutdown_timeout(),
                ..Default::default()
            },
        ));

        sentry::configure_scope(|scope| {
            scope.set_tag("service", name);
        });

        guard
    }

    /// Wraps the given guard in a background component that flushes pending
    /// events when the service stops.
    pub fn component(guard: SentryGuard) -> SentryFlush {
        let flush = SentryFlush::new();
        flush.slot().fill(guard);

        flush
    }

    fn release(name: &str, version: &str) -> Option<Cow<'static, str>> {
        match (name.is_empty(), version.is_empty()) {
            (_, true) => None,
            (true, false) => Some(Cow::Owned(version.to_string())),
            (false, false) => Some(Cow::Owned(format!("{}@{}", name, version))),
        }
    }
}
