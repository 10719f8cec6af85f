use keel_core::{BoxError, Component, Context, Gate, Latch, async_trait};
use parking_lot::Mutex;
use sentry::ClientInitGuard as SentryGuard;
use std::sync::Arc;

/// A shared place for the [Sentry guard](SentryGuard), filled once the
/// client is initialized.
#[derive(Clone, Default)]
pub struct SentrySlot {
    guard: Arc<Mutex<Option<SentryGuard>>>,
}

impl SentrySlot {
    /// Stores the guard, replacing (and dropping) any previous one.
    pub fn fill(&self, guard: SentryGuard) {
        let previous = self.guard.lock().replace(guard);
        drop(previous);
    }

    /// Reports whether a guard is stored.
    pub fn is_filled(&self) -> bool {
        self.guard.lock().is_some()
    }

    fn take(&self) -> Option<SentryGuard> {
        self.guard.lock().take()
    }
}

/// A background component that keeps the Sentry client alive for the whole
/// service lifetime and flushes pending events when asked to stop.
///
/// Flushing happens by dropping the [guard](SentryGuard), which blocks the
/// current thread for up to the configured shutdown timeout. To keep the
/// runtime responsive, the guard is dropped on the blocking thread pool.
pub struct SentryFlush {
    slot: SentrySlot,
    stopped: Latch,
}

impl SentryFlush {
    /// Creates the component with an empty [slot](SentrySlot). The guard may
    /// be provided later through [`slot`](SentryFlush::slot).
    pub fn new() -> Self {
        Self {
            slot: SentrySlot::default(),
            stopped: Latch::new(),
        }
    }

    /// Returns a handle on the slot where the guard is kept.
    pub fn slot(&self) -> SentrySlot {
        self.slot.clone()
    }
}

impl Default for SentryFlush {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Component for SentryFlush {
    fn name(&self) -> &str {
        "sentry"
    }

    async fn run(&self, _ctx: &Context) -> Result<(), BoxError> {
        self.stopped.gate().opened().await;

        Ok(())
    }

    fn stop(&self) -> Gate {
        self.stopped.release();

        match self.slot.take() {
            Some(guard) => Gate::after(async move {
                let _ = tokio::task::spawn_blocking(move || drop(guard)).await;
            }),
            None => Gate::ready(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SentryIntegration;

    #[tokio::test]
    async fn stop_without_guard() {
        // Given
        let flush = SentryFlush::new();

        // When
        let gate = flush.stop();

        // Then
        assert!(gate.is_open());
        assert!(!flush.slot().is_filled());
    }

    #[tokio::test]
    async fn stop_drops_guard() {
        // Given
        let guard = sentry::init(sentry::ClientOptions::default());
        let flush = SentryIntegration::component(guard);
        let slot = flush.slot();
        assert!(slot.is_filled());

        // When
        flush.stop().opened().await;

        // Then
        assert!(!slot.is_filled());
    }
}
