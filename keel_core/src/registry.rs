use crate::{Component, ConstructionError, Handle, KeyedComponent};
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Storage for the components of one service: keyed components by prefix, and
/// background components in registration order.
///
/// Populated once at construction time and read-only afterwards, except for the
/// per-entry readiness flag flipped by the initialization phase.
#[derive(Default)]
pub(crate) struct Registry {
    keyed: HashMap<String, KeyedEntry>,
    keyed_order: Vec<String>,
    background: Vec<Arc<dyn Component>>,
}

/// A registered [`KeyedComponent`] with its readiness flag.
pub(crate) struct KeyedEntry {
    component: Arc<dyn KeyedComponent>,
    ready: AtomicBool,
}

/// Represents the reasons a lookup in the keyed registry may fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No keyed component is registered under the prefix.
    #[error("no component registered under prefix '{prefix}'")]
    NotFound {
        /// The requested prefix.
        prefix: String,
    },

    /// The component is registered but was not successfully initialized yet.
    #[error("component registered under prefix '{prefix}' is not initialized")]
    NotReady {
        /// The requested prefix.
        prefix: String,
    },

    /// The component's handle is not of the expected type.
    #[error("component registered under prefix '{prefix}' does not provide {expected}")]
    CapabilityMismatch {
        /// The requested prefix.
        prefix: String,
        /// The type name of the expected capability.
        expected: &'static str,
    },
}

impl Registry {
    /// Registers a keyed component, rejecting duplicate prefixes.
    pub(crate) fn register_keyed(
        &mut self,
        component: Arc<dyn KeyedComponent>,
    ) -> Result<(), ConstructionError> {
        let prefix = component.prefix().to_string();

        if self.keyed.contains_key(&prefix) {
            return Err(ConstructionError::DuplicatePrefix { prefix });
        }

        self.keyed_order.push(prefix.clone());
        self.keyed.insert(
            prefix,
            KeyedEntry {
                component,
                ready: AtomicBool::new(false),
            },
        );

        Ok(())
    }

    /// Appends a background component.
    pub(crate) fn register_background(&mut self, component: Arc<dyn Component>) {
        self.background.push(component);
    }

    /// Iterates over keyed entries in registration order.
    pub(crate) fn keyed(&self) -> impl Iterator<Item = &KeyedEntry> {
        self.keyed_order
            .iter()
            .filter_map(|prefix| self.keyed.get(prefix))
    }

    /// Iterates over background components in registration order.
    pub(crate) fn background(&self) -> impl Iterator<Item = &Arc<dyn Component>> {
        self.background.iter()
    }

    /// Total number of registered components.
    pub(crate) fn len(&self) -> usize {
        self.keyed.len() + self.background.len()
    }

    /// Retrieves the untyped handle of an initialized keyed component.
    pub(crate) fn handle(&self, prefix: &str) -> Option<Handle> {
        self.ready_entry(prefix)
            .ok()
            .map(|entry| entry.component.handle())
    }

    /// Retrieves the handle of an initialized keyed component as `T`.
    pub(crate) fn lookup<T>(&self, prefix: &str) -> Result<Arc<T>, LookupError>
    where
        T: Any + Send + Sync,
    {
        let entry = self.ready_entry(prefix)?;

        entry
            .component
            .handle()
            .downcast::<T>()
            .map_err(|_| LookupError::CapabilityMismatch {
                prefix: prefix.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Retrieves the keyed entry registered under the given prefix, whether
    /// initialized or not.
    pub(crate) fn entry(&self, prefix: &str) -> Result<&KeyedEntry, LookupError> {
        self.keyed.get(prefix).ok_or_else(|| LookupError::NotFound {
            prefix: prefix.to_string(),
        })
    }

    fn ready_entry(&self, prefix: &str) -> Result<&KeyedEntry, LookupError> {
        let entry = self.entry(prefix)?;

        if !entry.is_ready() {
            return Err(LookupError::NotReady {
                prefix: prefix.to_string(),
            });
        }

        Ok(entry)
    }
}

impl KeyedEntry {
    /// The registered component.
    pub(crate) fn component(&self) -> &Arc<dyn KeyedComponent> {
        &self.component
    }

    /// Marks the component as successfully initialized.
    pub(crate) fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Reports whether the component was successfully initialized.
    pub(crate) fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}
