use crate::registry::Registry;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::select;
use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tracing::{Instrument, error, info, info_span, warn};

/// Stops every registered component concurrently and waits, within a single
/// shared timeout, for all of them to acknowledge.
pub(crate) struct Shutdown {
    timeout: Duration,
}

/// Reports a partial shutdown: some components did not acknowledge their stop
/// request within the timeout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "failed to stop all components within {timeout:?}: {} acknowledged, timed out: {}",
    .stopped.len(),
    .timed_out.join(", "),
)]
pub struct ShutdownTimeout {
    /// The configured timeout.
    pub timeout: Duration,
    /// Names of the components that acknowledged in time.
    pub stopped: Vec<String>,
    /// Names of the components that did not acknowledge in time.
    pub timed_out: Vec<String>,
}

/// A spawned stop task for one component.
struct StopTask {
    name: Arc<str>,
    handle: JoinHandle<()>,
}

impl Shutdown {
    /// Internal constructor.
    pub(crate) fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Asks every component in the registry to stop, then waits for exactly
    /// as many acknowledgements as there are components.
    ///
    /// Returns the count of components that acknowledged. If the timeout runs
    /// out first, the remaining stop tasks are aborted and [`ShutdownTimeout`]
    /// names the components that did not make it.
    pub(crate) async fn stop_all(&self, registry: &Registry) -> Result<usize, ShutdownTimeout> {
        let tasks = Self::fan_out(registry);
        let count = tasks.len();

        info!("Waiting for {} component(s) to stop", count);

        let mut names = Vec::with_capacity(count);
        let mut aborts: Vec<AbortHandle> = Vec::with_capacity(count);
        let mut futures = FuturesUnordered::new();

        for (index, StopTask { name, handle }) in tasks.into_iter().enumerate() {
            names.push(name);
            aborts.push(handle.abort_handle());
            futures.push(async move { (index, handle.await) });
        }

        let mut acknowledged = vec![false; count];
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        loop {
            select! {
                biased;
                outcome = futures.next() => match outcome {
                    Some((index, result)) => {
                        acknowledged[index] = true;
                        Self::receive_acknowledgement(&names[index], result);
                    }
                    None => {
                        info!("All components stopped");
                        return Ok(count);
                    }
                },
                _ = &mut deadline => {
                    return Err(self.receive_timeout(&names, &acknowledged, &aborts));
                }
            }
        }
    }

    /// Spawns one stop task per registered component, background components
    /// first.
    fn fan_out(registry: &Registry) -> Vec<StopTask> {
        let mut tasks = Vec::with_capacity(registry.len());

        for component in registry.background() {
            let name: Arc<str> = Arc::from(component.name());
            let component = Arc::clone(component);
            let span = info_span!("component", name = %name);

            let handle = tokio::spawn(
                async move {
                    component.stop().opened().await;
                }
                .instrument(span),
            );

            tasks.push(StopTask { name, handle });
        }

        for entry in registry.keyed() {
            let component = Arc::clone(entry.component());
            let name: Arc<str> = Arc::from(component.name());
            let span = info_span!("component", name = %name, prefix = component.prefix());

            let handle = tokio::spawn(
                async move {
                    component.stop().opened().await;
                }
                .instrument(span),
            );

            tasks.push(StopTask { name, handle });
        }

        tasks
    }

    fn receive_acknowledgement(name: &str, result: Result<(), JoinError>) {
        match result {
            Ok(()) => info!(component = name, "Stopped"),
            Err(join_error) => error!(
                alert = true,
                component = name,
                error = %join_error,
                "Stop task failed; treating the component as stopped",
            ),
        }
    }

    fn receive_timeout(
        &self,
        names: &[Arc<str>],
        acknowledged: &[bool],
        aborts: &[AbortHandle],
    ) -> ShutdownTimeout {
        let mut stopped = Vec::new();
        let mut timed_out = Vec::new();

        for ((name, &done), abort) in names.iter().zip(acknowledged).zip(aborts) {
            if done {
                stopped.push(name.to_string());
            } else {
                error!(component = name.as_ref(), "Did not stop in time");
                abort.abort();
                timed_out.push(name.to_string());
            }
        }

        warn!("Some components did not stop gracefully");

        ShutdownTimeout {
            timeout: self.timeout,
            stopped,
            timed_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxError, Component, Context};
    use async_trait::async_trait;
    use keel_sync::{Gate, Latch};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    /// Acknowledges after a delay, or never.
    struct Lingering {
        name: &'static str,
        delay: Option<Duration>,
        stops: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Component for Lingering {
        fn name(&self) -> &str {
            self.name
        }

        async fn run(&self, _ctx: &Context) -> Result<(), BoxError> {
            Ok(())
        }

        fn stop(&self) -> Gate {
            self.stops.fetch_add(1, Ordering::SeqCst);

            match self.delay {
                Some(delay) => Gate::after(tokio::time::sleep(delay)),
                None => Latch::new().gate(),
            }
        }
    }

    /// Does its stop work synchronously, holding the thread past the timeout.
    struct Busy {
        work: Duration,
    }

    #[async_trait]
    impl Component for Busy {
        fn name(&self) -> &str {
            "busy"
        }

        async fn run(&self, _ctx: &Context) -> Result<(), BoxError> {
            Ok(())
        }

        fn stop(&self) -> Gate {
            std::thread::sleep(self.work);

            Gate::ready()
        }
    }

    fn registry_with(components: Vec<Lingering>) -> Registry {
        let mut registry = Registry::default();

        for component in components {
            registry.register_background(Arc::new(component));
        }

        registry
    }

    fn lingering(name: &'static str, delay: Option<Duration>, stops: &Arc<AtomicUsize>) -> Lingering {
        Lingering {
            name,
            delay,
            stops: stops.clone(),
        }
    }

    #[tokio::test]
    async fn no_components() {
        // Given
        let shutdown = Shutdown::new(Duration::from_secs(5));
        let start = Instant::now();

        // When
        let count = shutdown.stop_all(&Registry::default()).await.unwrap();

        // Then
        assert_eq!(count, 0);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn waits_for_slowest() {
        // Given
        let stops = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(vec![
            lingering("fast", Some(Duration::from_millis(10)), &stops),
            lingering("slow", Some(Duration::from_millis(150)), &stops),
        ]);
        let shutdown = Shutdown::new(Duration::from_secs(5));
        let start = Instant::now();

        // When
        let count = shutdown.stop_all(&registry).await.unwrap();

        // Then
        assert_eq!(count, 2);
        assert_eq!(stops.load(Ordering::SeqCst), 2);
        assert!(
            start.elapsed() >= Duration::from_millis(150),
            "stop_all() should not return before the slowest component acknowledges",
        );
    }

    #[tokio::test]
    async fn timeout_names_hanging_component() {
        // Given
        let stops = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(vec![
            lingering("prompt", Some(Duration::from_millis(1)), &stops),
            lingering("hanging", None, &stops),
        ]);
        let shutdown = Shutdown::new(Duration::from_millis(100));
        let start = Instant::now();

        // When
        let error = shutdown.stop_all(&registry).await.unwrap_err();

        // Then
        assert_eq!(
            error,
            ShutdownTimeout {
                timeout: Duration::from_millis(100),
                stopped: vec!["prompt".to_string()],
                timed_out: vec!["hanging".to_string()],
            },
        );
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn acknowledgement_beats_expired_deadline() {
        // Given
        let mut registry = Registry::default();
        registry.register_background(Arc::new(Busy {
            work: Duration::from_millis(150),
        }));
        let shutdown = Shutdown::new(Duration::from_millis(50));

        // When
        let count = shutdown.stop_all(&registry).await.unwrap();

        // Then
        assert_eq!(count, 1);
    }
}
