use std::sync::{Arc, Mutex};

/// Shared, ordered record of lifecycle events observed by test components.
#[derive(Clone, Default)]
pub struct Journal {
    events: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    /// Initializes an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    /// Returns a snapshot of all events so far.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Counts the occurrences of the given event.
    pub fn count(&self, event: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|recorded| recorded.as_str() == event)
            .count()
    }

    /// Returns the events starting with the given prefix, in order.
    pub fn starting_with(&self, prefix: &str) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|recorded| recorded.starts_with(prefix))
            .cloned()
            .collect()
    }
}
