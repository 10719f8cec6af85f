use crate::common::journal::Journal;
use keel_core::{
    BoxError, Component, Context, Flag, FlagSet, Gate, Handle, KeyedComponent, Latch, async_trait,
};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// The capability exposed by a [`Store`]: a pretend client for a data store.
#[derive(Debug)]
pub struct StoreClient {
    pub prefix: String,
    pub uri: String,
}

/// Keyed test component that records its initialization and stop in a
/// [`Journal`] and exposes a [`StoreClient`] as its handle.
pub struct Store {
    prefix: &'static str,
    journal: Journal,
    failure: Option<&'static str>,
    panic: bool,
    uri: Option<Flag>,
    client: OnceLock<Arc<StoreClient>>,
}

impl Store {
    /// A store that initializes successfully.
    pub fn new(prefix: &'static str, journal: &Journal) -> Self {
        Self {
            prefix,
            journal: journal.clone(),
            failure: None,
            panic: false,
            uri: None,
            client: OnceLock::new(),
        }
    }

    /// A store whose initialization fails with the given message.
    pub fn failing(prefix: &'static str, journal: &Journal, message: &'static str) -> Self {
        Self {
            failure: Some(message),
            ..Self::new(prefix, journal)
        }
    }

    /// A store whose initialization panics.
    pub fn panicking(prefix: &'static str, journal: &Journal) -> Self {
        Self {
            panic: true,
            ..Self::new(prefix, journal)
        }
    }
}

#[async_trait]
impl Component for Store {
    fn name(&self) -> &str {
        self.prefix
    }

    fn init_flags(&mut self, flags: &mut FlagSet) {
        self.uri = Some(flags.declare(
            format!("{}-uri", self.prefix),
            format!("mem://{}", self.prefix),
            format!("URI of the {} store", self.prefix),
        ));
    }

    async fn run(&self, _ctx: &Context) -> Result<(), BoxError> {
        self.journal.record(format!("init:{}", self.prefix));

        if self.panic {
            panic!("{} blew up", self.prefix);
        }

        if let Some(message) = self.failure {
            return Err(message.into());
        }

        let uri = self.uri.as_ref().expect("flags declared").value().to_string();
        let _ = self.client.set(Arc::new(StoreClient {
            prefix: self.prefix.to_string(),
            uri,
        }));

        Ok(())
    }

    fn stop(&self) -> Gate {
        self.journal.record(format!("stop:{}", self.prefix));

        Gate::ready()
    }
}

impl KeyedComponent for Store {
    fn prefix(&self) -> &str {
        self.prefix
    }

    fn handle(&self) -> Handle {
        self.client.get().cloned().expect("initialized")
    }
}

/// Background test component that runs until stopped, optionally failing,
/// echoing keyed handles, or lingering on stop.
pub struct Worker {
    name: &'static str,
    journal: Journal,
    latch: Latch,
    failure: Option<(Duration, &'static str)>,
    panic: bool,
    echoes: Vec<&'static str>,
    linger: Linger,
}

enum Linger {
    No,
    For(Duration),
    Forever,
}

impl Worker {
    /// A worker that runs until stopped and acknowledges immediately.
    pub fn new(name: &'static str, journal: &Journal) -> Self {
        Self {
            name,
            journal: journal.clone(),
            latch: Latch::new(),
            failure: None,
            panic: false,
            echoes: Vec::new(),
            linger: Linger::No,
        }
    }

    /// Fails with the given message after the given delay.
    pub fn failing_after(mut self, delay: Duration, message: &'static str) -> Self {
        self.failure = Some((delay, message));
        self
    }

    /// Panics as soon as it runs.
    pub fn panicking(mut self) -> Self {
        self.panic = true;
        self
    }

    /// Looks up the [`StoreClient`]s under the given prefixes when it runs.
    pub fn echoing(mut self, prefixes: &[&'static str]) -> Self {
        self.echoes = prefixes.to_vec();
        self
    }

    /// Acknowledges its stop request only after the given delay.
    pub fn stopping_after(mut self, delay: Duration) -> Self {
        self.linger = Linger::For(delay);
        self
    }

    /// Never acknowledges its stop request.
    pub fn hanging(mut self) -> Self {
        self.linger = Linger::Forever;
        self
    }
}

#[async_trait]
impl Component for Worker {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self, ctx: &Context) -> Result<(), BoxError> {
        self.journal.record(format!("run:{}", self.name));

        if self.panic {
            panic!("{} blew up", self.name);
        }

        for prefix in &self.echoes {
            let client = ctx.lookup::<StoreClient>(prefix)?;
            self.journal
                .record(format!("echo:{}={}", client.prefix, client.uri));
        }

        let stopped = self.latch.gate();

        match self.failure {
            Some((delay, message)) => tokio::select! {
                _ = tokio::time::sleep(delay) => Err(message.into()),
                _ = stopped.opened() => Ok(()),
            },
            None => {
                stopped.opened().await;
                Ok(())
            }
        }
    }

    fn stop(&self) -> Gate {
        self.journal.record(format!("stop:{}", self.name));
        self.latch.release();

        match self.linger {
            Linger::No => Gate::ready(),
            Linger::For(delay) => Gate::after(tokio::time::sleep(delay)),
            Linger::Forever => Latch::new().gate(),
        }
    }
}
