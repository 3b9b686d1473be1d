//! Name-based lookup of step factories.

use std::collections::HashMap;

use thiserror::Error;

use super::TestStep;
use crate::event::EventName;

/// Creates a fresh step instance.
pub type StepFactory = fn() -> Box<dyn TestStep>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("step {0} is already registered")]
    Duplicate(String),
    #[error("step name must not be empty")]
    EmptyName,
}

struct Registration {
    factory: StepFactory,
    events: Vec<EventName>,
}

/// Registry of known steps and the events each is allowed to emit.
#[derive(Default)]
pub struct StepRegistry {
    steps: HashMap<String, Registration>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the steps shipped in this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        let (name, factory, events) = crate::slowecho::load();
        registry.insert(name, factory, events);
        registry
    }

    pub fn register(
        &mut self,
        name: &str,
        factory: StepFactory,
        events: Vec<EventName>,
    ) -> Result<(), RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.steps.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        self.insert(name, factory, events);
        Ok(())
    }

    fn insert(&mut self, name: &str, factory: StepFactory, events: Vec<EventName>) {
        tracing::debug!(step = name, events = events.len(), "registered step");
        self.steps
            .insert(name.to_string(), Registration { factory, events });
    }

    /// Instantiate the step registered under `name`.
    pub fn create(&self, name: &str) -> Option<Box<dyn TestStep>> {
        self.steps.get(name).map(|r| (r.factory)())
    }

    /// Events declared by the step registered under `name`.
    pub fn events(&self, name: &str) -> Option<&[EventName]> {
        self.steps.get(name).map(|r| r.events.as_slice())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.steps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
