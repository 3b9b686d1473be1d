//! Side-observation events emitted by steps.
//!
//! Emission is best effort: a failing emitter is logged by the caller and
//! never aborts a run.

use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use crate::target::Target;

/// Name of an event kind a step is allowed to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EventName(&'static str);

impl EventName {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// One emitted observation tied to a target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestEvent {
    pub step: String,
    pub name: EventName,
    pub target: Target,
    pub payload: String,
    pub emitted_at: DateTime<Utc>,
}

impl TestEvent {
    pub fn new(step: &str, name: EventName, target: Target, payload: impl Into<String>) -> Self {
        Self {
            step: step.to_string(),
            name,
            target,
            payload: payload.into(),
            emitted_at: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("event {0} is not declared by the emitting step")]
    Undeclared(EventName),
    #[error("event sink failure: {0}")]
    Sink(String),
}

/// Append-only sink for [`TestEvent`]s. Called concurrently by workers.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: TestEvent) -> Result<(), EmitError>;
}

/// Keeps every event in memory. Used by tests and embedders that inspect
/// events after a run.
#[derive(Debug, Default)]
pub struct MemoryEmitter {
    events: Mutex<Vec<TestEvent>>,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TestEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventEmitter for MemoryEmitter {
    fn emit(&self, event: TestEvent) -> Result<(), EmitError> {
        self.events.lock().push(event);
        Ok(())
    }
}

/// Writes events as structured log records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEmitter;

impl EventEmitter for TracingEmitter {
    fn emit(&self, event: TestEvent) -> Result<(), EmitError> {
        let payload = serde_json::to_string(&event).map_err(|e| EmitError::Sink(e.to_string()))?;
        tracing::info!(
            step = %event.step,
            event = %event.name,
            target_id = %event.target.id,
            %payload,
            "test event"
        );
        Ok(())
    }
}

/// Rejects events whose name was not declared by the step.
pub struct DeclaredEmitter<E> {
    inner: E,
    allowed: Vec<EventName>,
}

impl<E: EventEmitter> DeclaredEmitter<E> {
    pub fn new(inner: E, allowed: &[EventName]) -> Self {
        Self {
            inner,
            allowed: allowed.to_vec(),
        }
    }
}

impl<E: EventEmitter> EventEmitter for DeclaredEmitter<E> {
    fn emit(&self, event: TestEvent) -> Result<(), EmitError> {
        if !self.allowed.contains(&event.name) {
            return Err(EmitError::Undeclared(event.name));
        }
        self.inner.emit(event)
    }
}
