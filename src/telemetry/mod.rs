//! Telemetry for slowecho.
//!
//! Provides structured logging, run/worker spans, and metrics helpers.

mod logging;
mod metrics;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use self::metrics::{
    record_event_failure, record_run_duration, record_target_dispatched,
    record_target_dropped, record_target_forwarded, DropReason, EVENTS_FAILED, RUN_DURATION,
    TARGETS_DISPATCHED, TARGETS_DROPPED, TARGETS_FORWARDED,
};
pub use spans::{SpanExt, StepSpan};
