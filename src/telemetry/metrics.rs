//! Counters and histograms recorded through the `metrics` facade.
//!
//! Without an installed recorder these calls are no-ops.

use std::time::Duration;

use crate::signal::Interrupt;

pub const TARGETS_DISPATCHED: &str = "slowecho_targets_dispatched_total";
pub const TARGETS_FORWARDED: &str = "slowecho_targets_forwarded_total";
pub const TARGETS_DROPPED: &str = "slowecho_targets_dropped_total";
pub const EVENTS_FAILED: &str = "slowecho_events_failed_total";
pub const RUN_DURATION: &str = "slowecho_run_duration_seconds";

/// Why a worker did not forward its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Interrupted(Interrupt),
    OutputClosed,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interrupted(i) => i.as_str(),
            Self::OutputClosed => "output_closed",
        }
    }
}

pub fn record_target_dispatched() {
    metrics::counter!(TARGETS_DISPATCHED).increment(1);
}

pub fn record_target_forwarded() {
    metrics::counter!(TARGETS_FORWARDED).increment(1);
}

pub fn record_target_dropped(reason: DropReason) {
    metrics::counter!(TARGETS_DROPPED, "reason" => reason.as_str()).increment(1);
}

pub fn record_event_failure() {
    metrics::counter!(EVENTS_FAILED).increment(1);
}

pub fn record_run_duration(elapsed: Duration) {
    metrics::histogram!(RUN_DURATION).record(elapsed.as_secs_f64());
}
