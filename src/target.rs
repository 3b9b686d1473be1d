//! Work items flowing through a pipeline step.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unit of work handed from one step to the next.
///
/// Targets are never mutated by a step; they are moved from the input
/// channel to the output channel (or dropped).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    pub name: String,
}

impl Target {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target{{Name: \"{}\", ID: \"{}\"}}", self.name, self.id)
    }
}
