use std::fmt::{Display, Formatter};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// The termination signals recognized by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// `SIGINT`, or `ctrl_c` on non-Unix platforms.
    Interrupt,

    /// `SIGTERM`.
    Terminate,

    /// `SIGHUP`, reserved for configuration reload.
    HangUp,
}

impl Display for Signal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Interrupt => "interrupt",
            Self::Terminate => "terminate",
            Self::HangUp => "hangup",
        })
    }
}

/// What ends the run phase of a service, apart from a component failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    Signal(Signal),
    Requested,
}

/// A cloneable handle for ending the run phase of a
/// [`Service`](crate::Service) from another task.
///
/// Triggers sent before the service is started are kept and act as soon as it
/// starts.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: UnboundedSender<Trigger>,
}

impl ShutdownHandle {
    /// Requests the service to stop.
    pub fn stop(&self) {
        let _ = self.sender.send(Trigger::Requested);
    }

    /// Delivers a signal to the service as if it came from the OS.
    pub fn signal(&self, signal: Signal) {
        let _ = self.sender.send(Trigger::Signal(signal));
    }
}

/// Makes a new trigger channel.
pub(crate) fn channel() -> (ShutdownHandle, UnboundedReceiver<Trigger>) {
    let (sender, receiver) = unbounded_channel();

    (ShutdownHandle { sender }, receiver)
}

/// Subscribes to the OS termination signals and forwards the first one to the
/// given handle.
///
/// The subscription is established before this function returns. A repeated
/// signal intercepted after the first one exits the process immediately with a
/// non-zero status code: this is the fallback for components that do not
/// acknowledge their stop request.
///
/// Subscribing replaces the default signal behavior of the whole process, and
/// the default behavior is not restored when the returned task is aborted.
pub(crate) fn listen(handle: ShutdownHandle) -> std::io::Result<JoinHandle<()>> {
    let signals = OsSignals::subscribe()?;

    Ok(tokio::spawn(forward(signals, handle)))
}

async fn forward(mut signals: OsSignals, handle: ShutdownHandle) {
    // Wait for first signal
    let signal = signals.next().await;
    info!(%signal, "Termination signal intercepted");
    handle.signal(signal);

    // Wait for any subsequent signal
    let signal = signals.next().await;
    warn!(%signal, "Repeated termination signal intercepted; exiting");

    std::process::exit(1);
}

#[cfg(unix)]
struct OsSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl OsSignals {
    fn subscribe() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    async fn next(&mut self) -> Signal {
        tokio::select! {
            biased;
            _ = self.interrupt.recv() => Signal::Interrupt,
            _ = self.terminate.recv() => Signal::Terminate,
            _ = self.hangup.recv() => Signal::HangUp,
        }
    }
}

#[cfg(not(unix))]
struct OsSignals;

#[cfg(not(unix))]
impl OsSignals {
    fn subscribe() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn next(&mut self) -> Signal {
        match tokio::signal::ctrl_c().await {
            Ok(()) => Signal::Interrupt,
            Err(_) => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn handle_delivers_triggers_in_order() {
        // Given
        let (handle, mut receiver) = channel();

        // When
        handle.signal(Signal::HangUp);
        handle.clone().stop();

        // Then
        assert_eq!(receiver.recv().await, Some(Trigger::Signal(Signal::HangUp)));
        assert_eq!(receiver.recv().await, Some(Trigger::Requested));
    }
}
