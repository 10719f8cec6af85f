use std::future::Future;
use tokio_util::sync::CancellationToken;

/// A one-shot acknowledgement that can be released exactly once, opening every
/// associated [`Gate`].
///
/// Components hand a [`Gate`] back from their `stop` method and keep the
/// [`Latch`] to themselves: releasing the latch tells the orchestrator that the
/// component's teardown is finished.
///
/// ## Example
///
/// ```
/// use keel_sync::{Gate, Latch};
///
/// # tokio_test::block_on(async {
///
/// // Make a latch
/// let latch = Latch::new();
///
/// // Derive a gate from it
/// let gate = latch.gate();
///
/// // Tear something down in the background
/// tokio::spawn(async move {
///     println!("Closing connections");
///
///     // Acknowledge
///     latch.release();
/// });
///
/// // Wait for the acknowledgement
/// gate.opened().await;
/// # })
/// ```
#[derive(Debug, Default, Clone)]
pub struct Latch {
    token: CancellationToken,
}

/// A single-release barrier that is [opened](Gate::opened) when the associated
/// [`Latch`] is [released](Latch::release).
///
/// This gate can be cheaply cloned and awaited on by any number of asynchronous
/// tasks at any time.
#[derive(Debug, Clone)]
pub struct Gate {
    token: CancellationToken,
}

impl Latch {
    /// Returns a brand new, unreleased [`Latch`].
    pub fn new() -> Self {
        let token = CancellationToken::new();

        Self { token }
    }

    /// Returns a new [`Gate`] handle associated with this [`Latch`].
    pub fn gate(&self) -> Gate {
        Gate {
            token: self.token.clone(),
        }
    }

    /// Permanently releases this [`Latch`], opening all associated [`Gate`]s.
    /// Subsequent calls have no additional effect.
    pub fn release(&self) {
        self.token.cancel();
    }

    /// Reports whether this [`Latch`] has been released.
    pub fn is_released(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Gate {
    /// Returns a [`Gate`] that is already open. Suitable for components that
    /// have nothing to tear down.
    pub fn ready() -> Self {
        let latch = Latch::new();
        latch.release();

        latch.gate()
    }

    /// Spawns the given teardown future on the current Tokio runtime and
    /// returns a [`Gate`] that opens once the teardown completes.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn after<F>(teardown: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let latch = Latch::new();
        let gate = latch.gate();

        tokio::spawn(async move {
            teardown.await;
            latch.release();
        });

        gate
    }

    /// Waits asynchronously until the associated [`Latch`] is
    /// [released](Latch::release). Resolves immediately if the latch has
    /// already been released.
    pub async fn opened(&self) {
        self.token.cancelled().await;
    }

    /// Reports whether the associated [`Latch`] has been released.
    pub fn is_open(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn release_opens_gate() {
        let (latch, gate, marker) = make_objects();

        tokio::spawn(work_and_release(latch));
        tokio::spawn(await_opened_and_flip_marker(gate, marker.clone()));

        sleep_a_little().await;

        assert!(marker.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn waiting_before_release() {
        let (latch, gate, marker) = make_objects();

        tokio::spawn(await_opened_and_flip_marker(gate, marker.clone()));
        sleep_a_little().await;
        assert!(!marker.load(Ordering::Relaxed));

        tokio::spawn(work_and_release(latch));
        sleep_a_little().await;

        assert!(marker.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn cloned_gates_all_open() {
        let latch = Latch::new();
        let gate_a = latch.gate();
        let gate_b = gate_a.clone();
        let marker_a = Arc::new(AtomicBool::new(false));
        let marker_b = Arc::new(AtomicBool::new(false));

        tokio::spawn(work_and_release(latch));
        tokio::spawn(await_opened_and_flip_marker(gate_a, marker_a.clone()));
        tokio::spawn(await_opened_and_flip_marker(gate_b, marker_b.clone()));

        sleep_a_little().await;

        assert!(marker_a.load(Ordering::Relaxed));
        assert!(marker_b.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn repeated_release() {
        let (latch, gate, _) = make_objects();

        latch.release();
        latch.release();

        assert!(latch.is_released());
        assert!(gate.is_open());
    }

    #[test]
    fn ready_gate_is_open() {
        assert_eq!(Gate::ready().is_open(), true);
    }

    #[tokio::test]
    async fn gate_after_teardown() {
        // Given
        let marker = Arc::new(AtomicBool::new(false));
        let teardown_marker = marker.clone();

        // When
        let gate = Gate::after(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            teardown_marker.store(true, Ordering::SeqCst);
        });

        // Then
        assert!(!gate.is_open());
        gate.opened().await;
        assert!(marker.load(Ordering::SeqCst));
    }

    fn make_objects() -> (Latch, Gate, Arc<AtomicBool>) {
        let latch = Latch::new();
        let gate = latch.gate();

        (latch, gate, Arc::new(AtomicBool::new(false)))
    }

    async fn work_and_release(latch: Latch) {
        tokio::time::sleep(Duration::from_millis(2)).await;
        latch.release();
    }

    async fn await_opened_and_flip_marker(gate: Gate, marker: Arc<AtomicBool>) {
        gate.opened().await;
        marker.store(true, Ordering::Relaxed);
    }

    async fn sleep_a_little() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
