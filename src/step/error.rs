//! Step error types.
//!
//! Only configuration and contract violations are errors. Per-target outcomes
//! (forwarded or dropped) are never surfaced through this type.

use thiserror::Error;

/// Errors returned by [`TestStep`](super::TestStep) operations.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("missing '{name}' field in {step} parameters")]
    MissingParameter { step: &'static str, name: &'static str },

    #[error("invalid '{name}' parameter in {step} parameters: {reason}")]
    InvalidParameter {
        step: &'static str,
        name: &'static str,
        reason: String,
    },

    #[error("step {step_name} does not support resume")]
    ResumeNotSupported { step_name: String },

    #[error("unknown step: {0}")]
    UnknownStep(String),
}

impl StepError {
    /// Returns true if the error comes from parameter validation.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter { .. } | Self::InvalidParameter { .. }
        )
    }
}
