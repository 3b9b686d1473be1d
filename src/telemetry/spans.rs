//! Span utilities for step runs.

use tracing::{info_span, Span};

/// Extension trait for recording outcomes into a span.
pub trait SpanExt {
    /// Record the result of an operation into the span.
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }
}

/// Factory for standardized step spans.
pub struct StepSpan;

impl StepSpan {
    /// Span covering one `run` call.
    ///
    /// Fields filled in later:
    /// - `status` / `error.message`: via `SpanExt::record_result`
    /// - `dispatched`: number of workers started
    /// - `stopped_by`: `cancelled`, `paused` or `end_of_input`
    pub fn run(step: &str) -> Span {
        info_span!(
            "step_run",
            step = %step,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
            dispatched = tracing::field::Empty,
            stopped_by = tracing::field::Empty,
        )
    }

    /// Span covering one delay worker.
    pub fn worker(step: &str, target_id: &str, target_name: &str) -> Span {
        info_span!(
            "echo_worker",
            step = %step,
            target_id = %target_id,
            target_name = %target_name,
            outcome = tracing::field::Empty,
        )
    }
}
