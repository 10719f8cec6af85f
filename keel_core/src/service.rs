use crate::directive::Settings;
use crate::env::APP_ENV_DEV;
use crate::registry::{KeyedEntry, Registry};
use crate::service::state::ServiceState;
use crate::shutdown::Shutdown;
use crate::signal::{self, Trigger};
use crate::{
    AppEnv, BoxError, Component, ConstructionError, Context, Directive, DotEnv, FlagSet, Handle,
    LookupError, ServiceError, ShutdownHandle, ShutdownTimeout, Signal,
};
use futures::FutureExt;
use keel_sync::Latch;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::select;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{Instrument, error, info, info_span, warn};

pub mod state;

/// Name of the flag that selects the [`AppEnv`].
pub const APP_ENV_FLAG: &str = "app-env";

/// The component lifecycle orchestrator.
///
/// A service owns every registered component and drives them through a
/// two-phase protocol:
///
/// 1. [`init`](Service::init) runs the **keyed** components one by one, in
///    registration order. Their handles become available for
///    [lookup](Service::lookup) as soon as each one succeeds.
/// 2. [`start`](Service::start) runs all **background** components
///    concurrently and blocks until a component fails, a termination signal
///    arrives, or a stop is [requested](ShutdownHandle::stop).
///
/// Either way, the service ends by [stopping](Service::stop) every component
/// concurrently and waiting (within a bounded timeout) for each of them to
/// acknowledge.
///
/// A service goes through its [states](ServiceState) exactly once and is not
/// reusable.
pub struct Service {
    settings: Settings,
    env: AppEnv,
    flags: FlagSet,
    registry: Arc<Registry>,
    shutdown: Shutdown,
    state: Mutex<ServiceState>,
    handle: ShutdownHandle,
    triggers: Mutex<Option<UnboundedReceiver<Trigger>>>,
    stopped: Latch,
}

/// Describes how the run phase of a [`Service`] ended without a component
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// An interrupt or terminate signal was received.
    Signal(Signal),

    /// A hang-up signal was received. All components were still stopped; the
    /// caller may construct a fresh service to pick up new configuration.
    Reload,

    /// A stop was requested through a [`ShutdownHandle`] or
    /// [`Service::stop`].
    Requested,
}

impl Service {
    /// Constructs a service by applying the given directives in order.
    ///
    /// ## Panics
    ///
    /// Panics on any [`ConstructionError`], most notably a duplicate keyed
    /// prefix: the process must not start with an ambiguous registry. Use
    /// [`try_new`](Service::try_new) to handle the error instead.
    pub fn new(directives: impl IntoIterator<Item = Directive>) -> Self {
        match Self::try_new(directives) {
            Ok(service) => service,
            Err(error) => {
                error!(%error, "Failed to construct service");
                panic!("{}", error);
            }
        }
    }

    /// Constructs a service by applying the given directives in order.
    ///
    /// Every registered component declares its flags as it is registered.
    /// Once all directives are applied, dot-env files are loaded and the flags
    /// are resolved from the environment.
    pub fn try_new(
        directives: impl IntoIterator<Item = Directive>,
    ) -> Result<Self, ConstructionError> {
        let mut settings = Settings::default();
        let mut flags = FlagSet::new();
        let mut registry = Registry::default();

        let app_env = flags.declare(
            APP_ENV_FLAG,
            APP_ENV_DEV,
            "Env for service. Ex: dev | stg | prd",
        );

        for directive in directives {
            settings.apply(&directive);

            match directive {
                Directive::Runnable(mut component) => {
                    component.init_flags(&mut flags);
                    registry.register_background(Arc::from(component));
                }
                Directive::InitRunnable(mut component) => {
                    component.init_flags(&mut flags);
                    registry.register_keyed(Arc::from(component))?;
                }
                _ => {}
            }
        }

        if let Some(name) = flags.duplicates().first() {
            return Err(ConstructionError::DuplicateFlag { name: name.clone() });
        }

        DotEnv::load(settings.env_file().map(PathBuf::as_path))?;
        flags.parse();
        settings.default_name_from_args();

        let env = AppEnv::new(app_env.value());
        let shutdown = Shutdown::new(settings.shutdown_timeout());
        let (handle, triggers) = signal::channel();

        Ok(Self {
            settings,
            env,
            flags,
            registry: Arc::new(registry),
            shutdown,
            state: Mutex::new(ServiceState::Constructed),
            handle,
            triggers: Mutex::new(Some(triggers)),
            stopped: Latch::new(),
        })
    }
}

impl Service {
    /// The service name.
    pub fn name(&self) -> &str {
        self.settings.name()
    }

    /// The service version.
    pub fn version(&self) -> &str {
        self.settings.version()
    }

    /// The deployment environment.
    pub fn env(&self) -> &AppEnv {
        &self.env
    }

    /// The settings accumulated from the construction directives.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The flags declared by the service and its components.
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    /// Renders a sample dot-env file covering every declared flag.
    pub fn sample_env(&self) -> String {
        self.flags.sample_env()
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ServiceState {
        *self.state.lock()
    }

    /// Returns a handle for ending the run phase from another task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.handle.clone()
    }

    /// Returns the read-only registry view handed to components.
    pub fn context(&self) -> Context {
        Context::new(Arc::clone(&self.registry))
    }
}

impl Service {
    /// Retrieves the untyped handle of the keyed component registered under
    /// the given prefix. Reports `None` if there is no such component or it is
    /// not initialized yet.
    pub fn handle(&self, prefix: &str) -> Option<Handle> {
        self.registry.handle(prefix)
    }

    /// Retrieves the handle of the keyed component registered under the given
    /// prefix as the expected capability `T`.
    pub fn lookup<T>(&self, prefix: &str) -> Result<Arc<T>, LookupError>
    where
        T: Any + Send + Sync,
    {
        self.registry.lookup(prefix)
    }

    /// Like [`lookup`](Service::lookup), for call sites where a missing
    /// component is an unrecoverable configuration error.
    ///
    /// ## Panics
    ///
    /// Panics if the lookup fails for any reason.
    pub fn must_lookup<T>(&self, prefix: &str) -> Arc<T>
    where
        T: Any + Send + Sync,
    {
        match self.lookup(prefix) {
            Ok(handle) => handle,
            Err(error) => panic!("can not get {}: {}", prefix, error),
        }
    }
}

impl Service {
    /// Runs every keyed component sequentially, in registration order.
    ///
    /// The first failure aborts the phase and is returned as-is. Components
    /// initialized before the failure remain initialized; cleaning them up is
    /// the job of [`stop`](Service::stop).
    pub async fn init(&self) -> Result<(), ServiceError> {
        self.transition("init", ServiceState::Constructed, ServiceState::Initializing)?;

        self.init_entries(self.registry.keyed()).await?;

        self.transition("init", ServiceState::Initializing, ServiceState::Initialized)
    }

    /// Like [`init`](Service::init), but runs only the keyed components
    /// registered under the given prefixes, in the given order. The other
    /// keyed components stay uninitialized and their lookups report
    /// [`NotReady`](LookupError::NotReady).
    ///
    /// Useful for tools that need a subset of the service, such as a
    /// migration that needs only the database. Every prefix is checked before
    /// anything runs: an unknown prefix is reported as
    /// [`NotFound`](LookupError::NotFound) and leaves the service untouched.
    pub async fn init_prefixes(&self, prefixes: &[&str]) -> Result<(), ServiceError> {
        let mut entries: Vec<&KeyedEntry> = Vec::with_capacity(prefixes.len());

        for prefix in prefixes {
            let entry = self.registry.entry(prefix)?;

            if !entries.iter().any(|seen| std::ptr::eq(*seen, entry)) {
                entries.push(entry);
            }
        }

        self.transition("init", ServiceState::Constructed, ServiceState::Initializing)?;

        self.init_entries(entries).await?;

        self.transition("init", ServiceState::Initializing, ServiceState::Initialized)
    }

    /// Runs a function against the service and returns its outcome.
    ///
    /// Typically called after [`init`](Service::init) or
    /// [`init_prefixes`](Service::init_prefixes) for one-off jobs that use the
    /// keyed components' handles without entering the run phase. The function
    /// cannot run once the service is stopping.
    pub async fn run_function<F, T>(&self, function: F) -> Result<T, ServiceError>
    where
        F: AsyncFnOnce(&Service) -> Result<T, BoxError>,
    {
        let state = self.state();

        if state.is_stopping_or_stopped() {
            return Err(ServiceError::InvalidState {
                operation: "run a function on",
                state,
            });
        }

        function(self)
            .await
            .map_err(|source| ServiceError::Function { source })
    }

    /// Runs every background component concurrently and blocks until the
    /// service terminates, then stops all components.
    ///
    /// - If a background component fails, returns its error (only the first
    ///   failure is reported).
    /// - If an interrupt or terminate signal arrives, returns
    ///   [`Exit::Signal`].
    /// - If a hang-up signal arrives, returns [`Exit::Reload`].
    /// - If a stop is requested, returns [`Exit::Requested`].
    ///
    /// A successful termination whose shutdown times out is reported as
    /// [`ServiceError::ShutdownTimeout`].
    pub async fn start(&self) -> Result<Exit, ServiceError> {
        let (mut triggers, listener) = {
            let mut state = self.state.lock();

            if *state != ServiceState::Initialized {
                return Err(ServiceError::InvalidState {
                    operation: "start",
                    state: *state,
                });
            }

            let listener = signal::listen(self.handle.clone()).map_err(ServiceError::Signal)?;

            let Some(triggers) = self.triggers.lock().take() else {
                listener.abort();
                return Err(ServiceError::InvalidState {
                    operation: "start",
                    state: *state,
                });
            };

            *state = ServiceState::Running;

            (triggers, listener)
        };

        let results = self.spawn_background();

        info!(
            service = self.name(),
            version = self.version(),
            env = %self.env,
            "Service started",
        );

        let outcome = Self::watch(results, &mut triggers).await;
        let stopped = self.stop().await;

        listener.abort();

        match (outcome, stopped) {
            (Ok(exit), Ok(())) => Ok(exit),
            (Ok(_), Err(timeout)) => Err(timeout.into()),
            (Err(error), Ok(())) => Err(error),
            (Err(error), Err(timeout)) => {
                warn!(%timeout, "Shutdown after component failure was partial");
                Err(error)
            }
        }
    }

    /// Asks every registered component (background and keyed) to stop, and
    /// waits until each of them acknowledges or the shutdown timeout runs out.
    ///
    /// Calling this method while a stop is already under way waits for that
    /// stop to finish instead of stopping components a second time. Calling it
    /// while the service is running also ends the [run phase](Service::start).
    pub async fn stop(&self) -> Result<(), ShutdownTimeout> {
        let previous = {
            let mut state = self.state.lock();
            let previous = *state;

            if !previous.is_stopping_or_stopped() {
                *state = ServiceState::Stopping;
            }

            previous
        };

        if previous.is_stopping_or_stopped() {
            info!("Service is already stopping");
            self.stopped.gate().opened().await;
            return Ok(());
        }

        if previous == ServiceState::Running {
            self.handle.stop();
        }

        info!("Stopping service...");

        let outcome = self.shutdown.stop_all(&self.registry).await;

        *self.state.lock() = ServiceState::Stopped;
        self.stopped.release();

        info!("Service stopped");

        outcome.map(|_| ())
    }
}

impl Service {
    fn transition(
        &self,
        operation: &'static str,
        from: ServiceState,
        to: ServiceState,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock();

        if *state != from {
            return Err(ServiceError::InvalidState {
                operation,
                state: *state,
            });
        }

        *state = to;

        Ok(())
    }

    /// Runs the given keyed components one by one, marking each ready as soon
    /// as it succeeds. Stops at the first failure.
    async fn init_entries<'a>(
        &self,
        entries: impl IntoIterator<Item = &'a KeyedEntry>,
    ) -> Result<(), ServiceError> {
        let ctx = self.context();

        for entry in entries {
            let component = entry.component();
            let prefix = component.prefix();
            let span = info_span!("component", name = component.name(), prefix);

            let result = async {
                info!("Initializing");
                catch_panic(component.name(), component.run(&ctx)).await
            }
            .instrument(span)
            .await;

            let error = match result {
                Ok(Ok(())) => {
                    entry.mark_ready();
                    continue;
                }
                Ok(Err(source)) => ServiceError::Init {
                    prefix: prefix.to_string(),
                    source,
                },
                Err(panicked) => panicked,
            };

            error!(
                alert = true,
                component = component.name(),
                prefix,
                %error,
                "Failed to initialize",
            );

            return Err(error);
        }

        Ok(())
    }

    /// Spawns one task per background component. Each task reports the
    /// component's outcome on the returned single-slot channel.
    fn spawn_background(&self) -> mpsc::Receiver<(Arc<str>, Result<(), ServiceError>)> {
        let (sender, receiver) = mpsc::channel(1);

        for component in self.registry.background() {
            let component = Arc::clone(component);
            let name: Arc<str> = Arc::from(component.name());
            let span = info_span!("component", name = %name);
            let ctx = self.context();
            let sender = sender.clone();

            tokio::spawn(
                async move {
                    let outcome = run_guarded(component.as_ref(), &ctx).await;
                    let _ = sender.send((name, outcome)).await;
                }
                .instrument(span),
            );
        }

        receiver
    }

    /// Waits for the first component failure or termination trigger.
    async fn watch(
        mut results: mpsc::Receiver<(Arc<str>, Result<(), ServiceError>)>,
        triggers: &mut UnboundedReceiver<Trigger>,
    ) -> Result<Exit, ServiceError> {
        loop {
            select! {
                Some((name, outcome)) = results.recv() => match outcome {
                    Ok(()) => info!(component = name.as_ref(), "Finished running"),
                    Err(error) => {
                        error!(alert = true, component = name.as_ref(), %error, "Component failed");
                        return Err(error);
                    }
                },
                Some(trigger) = triggers.recv() => {
                    info!(?trigger, "Termination triggered");

                    return Ok(match trigger {
                        Trigger::Signal(Signal::HangUp) => Exit::Reload,
                        Trigger::Signal(signal) => Exit::Signal(signal),
                        Trigger::Requested => Exit::Requested,
                    });
                }
            }
        }
    }
}

/// Runs a background component, converting a panic into an error.
async fn run_guarded(component: &dyn Component, ctx: &Context) -> Result<(), ServiceError> {
    info!("Running");

    catch_panic(component.name(), component.run(ctx))
        .await?
        .map_err(|source| ServiceError::Component {
            name: component.name().to_string(),
            source,
        })
}

/// Awaits a component's run, reporting a panic as [`ServiceError::Panicked`].
async fn catch_panic(
    name: &str,
    run: impl Future<Output = Result<(), BoxError>>,
) -> Result<Result<(), BoxError>, ServiceError> {
    AssertUnwindSafe(run)
        .catch_unwind()
        .await
        .map_err(|payload| ServiceError::Panicked {
            name: name.to_string(),
            message: panic_message(payload.as_ref()),
        })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return message.to_string();
    }

    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }

    "non-string panic payload".to_string()
}
