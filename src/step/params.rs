//! Raw step parameters as supplied by a job descriptor.
//!
//! Every parameter name maps to a list of raw string values. Steps read the
//! values they need and validate them before any target is processed.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single raw parameter value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Param(String);

impl Param {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn raw(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parameters for one step, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepParameters(HashMap<String, Vec<Param>>);

impl StepParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a single value, replacing any previous values.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), vec![Param::new(value)]);
    }

    /// Append a value to the list for `name`.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_default().push(Param::new(value));
    }

    /// First value for `name`, if any.
    pub fn get_one(&self, name: &str) -> Option<&Param> {
        self.0.get(name).and_then(|values| values.first())
    }

    pub fn get(&self, name: &str) -> &[Param] {
        self.0.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
