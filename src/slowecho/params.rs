//! Parsed and validated SlowEcho parameters.

use std::time::Duration;

use crate::step::{StepError, StepParameters};

use super::SlowEcho;

pub const TEXT: &str = "text";
pub const SLEEP: &str = "sleep";

/// Validated SlowEcho configuration. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlowEchoParams {
    /// Echoed alongside each target once its delay has elapsed.
    pub text: String,
    /// Per-target delay.
    pub sleep: Duration,
}

impl SlowEchoParams {
    pub fn from_parameters(params: &StepParameters) -> Result<Self, StepError> {
        let text = params
            .get_one(TEXT)
            .filter(|p| !p.is_empty())
            .ok_or(StepError::MissingParameter {
                step: SlowEcho::NAME,
                name: TEXT,
            })?;
        let sleep = params
            .get_one(SLEEP)
            .filter(|p| !p.is_empty())
            .ok_or(StepError::MissingParameter {
                step: SlowEcho::NAME,
                name: SLEEP,
            })?;

        Ok(Self {
            text: text.raw().to_string(),
            sleep: sleep_time(sleep.raw())?,
        })
    }
}

/// Parse a whole number of seconds. Negative values are rejected.
pub fn sleep_time(raw: &str) -> Result<Duration, StepError> {
    let invalid = |reason: String| StepError::InvalidParameter {
        step: SlowEcho::NAME,
        name: SLEEP,
        reason,
    };
    let seconds: i64 = raw
        .parse()
        .map_err(|e| invalid(format!("{raw:?} is not an integer: {e}")))?;
    if seconds < 0 {
        return Err(invalid("seconds cannot be negative".to_string()));
    }
    Ok(Duration::from_secs(seconds as u64))
}
