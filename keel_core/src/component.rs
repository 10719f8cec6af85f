use crate::registry::Registry;
use crate::{FlagSet, LookupError};
use async_trait::async_trait;
use keel_sync::Gate;
use std::any::Any;
use std::error::Error;
use std::sync::Arc;

/// Boxed error returned by [`Component::run`].
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// The live resource managed by a [`KeyedComponent`] (a connection pool, an SDK
/// client, etc.), type-erased for storage in the registry.
///
/// Callers usually retrieve it through the typed [`Context::lookup`] or
/// [`Service::lookup`](crate::Service::lookup) instead of downcasting by hand.
pub type Handle = Arc<dyn Any + Send + Sync>;

/// The contract every pluggable unit satisfies to take part in the service
/// lifecycle.
///
/// A component registered as a **background** component is
/// [run](Component::run) concurrently with all other background components for
/// the whole lifetime of the service (e.g., a transport listener). Its `run`
/// future is expected to stay pending until the component is asked to
/// [stop](Component::stop).
///
/// ## Lifecycle
///
/// 1. [`init_flags`](Component::init_flags) is called exactly once, at
///    construction time, in registration order.
/// 2. [`run`](Component::run) is called at most once.
/// 3. [`stop`](Component::stop) is called at most once, possibly while `run`
///    is still pending on another task.
#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// Human-readable name used in log entries and shutdown reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Declares the externally configurable parameters of this component.
    ///
    /// The returned [`Flag`](crate::Flag) handles are resolved before
    /// [`run`](Component::run) is called, so the component may keep them and
    /// read their values later.
    fn init_flags(&mut self, _flags: &mut FlagSet) {}

    /// Runs the component.
    ///
    /// For a background component this resolves only when the component is
    /// done serving (an error here is fatal to the whole service). For a
    /// [`KeyedComponent`] this establishes the managed resource and resolves as
    /// soon as the resource is ready.
    async fn run(&self, ctx: &Context) -> Result<(), BoxError>;

    /// Asks the component to tear down, returning a [`Gate`] that opens once
    /// the teardown is complete.
    ///
    /// Stop requests are advisory: the component is trusted to wind down its
    /// own tasks. A gate that never opens is reported as timed out during the
    /// service shutdown.
    fn stop(&self) -> Gate;
}

/// A [`Component`] registered under a unique key, initialized before the
/// service starts, whose [handle](KeyedComponent::handle) can later be
/// retrieved by that key.
pub trait KeyedComponent: Component {
    /// The unique registration key of this component.
    fn prefix(&self) -> &str;

    /// Returns the live resource managed by this component.
    ///
    /// Only called by the registry after [`run`](Component::run) has returned
    /// successfully.
    fn handle(&self) -> Handle;
}

/// Read-only view of the service registry handed to [`Component::run`].
///
/// A component may use it to retrieve the handles of keyed components that
/// were registered (and therefore initialized) before it.
#[derive(Clone)]
pub struct Context {
    registry: Arc<Registry>,
}

impl Context {
    /// Internal constructor.
    pub(crate) fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Retrieves the untyped [`Handle`] registered under the given prefix, if
    /// the keyed component exists and has been initialized.
    pub fn handle(&self, prefix: &str) -> Option<Handle> {
        self.registry.handle(prefix)
    }

    /// Retrieves the handle registered under the given prefix as the expected
    /// capability `T`.
    pub fn lookup<T>(&self, prefix: &str) -> Result<Arc<T>, LookupError>
    where
        T: Any + Send + Sync,
    {
        self.registry.lookup(prefix)
    }
}
