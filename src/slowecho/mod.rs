//! SlowEcho: delays every target by a fixed duration, echoes a configured
//! text for it, then forwards it downstream.
//!
//! Each target gets its own worker task, so a slow target never holds up the
//! next one and output order may differ from input order. Cancel and pause
//! are observed by the dispatch loop and by every worker independently:
//!
//! - a signal seen by the dispatch loop stops reading input;
//! - a signal seen during a worker's delay drops that target;
//! - a signal seen while forwarding drops that target. A signal racing a
//!   forward that is already ready may still let the target through.
//!
//! `run` returns only after every worker it started has finished.

mod params;
mod worker;

pub use params::{sleep_time, SlowEchoParams, SLEEP, TEXT};

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::Instrument;

use crate::event::{EventEmitter, EventName};
use crate::signal::{ControlSignals, Interrupt};
use crate::step::{InFlightTracker, StepChannels, StepError, StepFactory, StepParameters, TestStep};
use crate::telemetry::{self, SpanExt, StepSpan};

use worker::WorkerContext;

/// Emitted once per target after its delay has elapsed.
pub const TARGET_ECHOED: EventName = EventName::new("TargetEchoed");

/// Events SlowEcho is allowed to emit.
pub const EVENTS: &[EventName] = &[TARGET_ECHOED];

/// Registration triple: name, factory and declared events.
pub fn load() -> (&'static str, StepFactory, Vec<EventName>) {
    (SlowEcho::NAME, factory, EVENTS.to_vec())
}

fn factory() -> Box<dyn TestStep> {
    Box::new(SlowEcho::new())
}

/// The SlowEcho step. Stateless; all run state lives inside `run`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SlowEcho;

impl SlowEcho {
    pub const NAME: &'static str = "SlowEcho";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TestStep for SlowEcho {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate_parameters(&self, params: &StepParameters) -> Result<(), StepError> {
        SlowEchoParams::from_parameters(params).map(|_| ())
    }

    async fn run(
        &self,
        signals: &ControlSignals,
        channels: StepChannels,
        params: &StepParameters,
        emitter: Arc<dyn EventEmitter>,
    ) -> Result<(), StepError> {
        let span = StepSpan::run(Self::NAME);
        let result = async {
            let params = SlowEchoParams::from_parameters(params)?;
            dispatch(params, signals, channels, emitter).await;
            Ok::<(), StepError>(())
        }
        .instrument(span.clone())
        .await;
        span.record_result(&result);
        result
    }

    fn can_resume(&self) -> bool {
        false
    }

    async fn resume(
        &self,
        _signals: &ControlSignals,
        _channels: StepChannels,
        _params: &StepParameters,
        _emitter: Arc<dyn EventEmitter>,
    ) -> Result<(), StepError> {
        Err(StepError::ResumeNotSupported {
            step_name: Self::NAME.to_string(),
        })
    }
}

/// Read targets and start one worker per target until the input ends or a
/// control signal fires, then wait for all workers.
async fn dispatch(
    params: SlowEchoParams,
    signals: &ControlSignals,
    channels: StepChannels,
    emitter: Arc<dyn EventEmitter>,
) {
    let started = Instant::now();
    let StepChannels { mut input, output } = channels;
    let ctx = Arc::new(WorkerContext {
        params,
        signals: signals.clone(),
        output,
        emitter,
    });
    let in_flight = InFlightTracker::new();
    let mut dispatched: u64 = 0;

    let stopped_by = loop {
        tokio::select! {
            // Signals first: nothing is dispatched once either has fired.
            biased;
            interrupt = signals.interrupted() => {
                match interrupt {
                    Interrupt::Cancel => tracing::info!("cancellation requested"),
                    Interrupt::Pause => tracing::info!("pause requested"),
                }
                break interrupt.as_str();
            }
            next = input.recv() => {
                let Some(target) = next else {
                    tracing::debug!("no more targets incoming");
                    break "end_of_input";
                };
                let guard = in_flight.track();
                let worker_span = StepSpan::worker(SlowEcho::NAME, &target.id, &target.name);
                tokio::spawn(worker::echo(ctx.clone(), target, guard).instrument(worker_span));
                telemetry::record_target_dispatched();
                dispatched += 1;
            }
        }
    };

    let span = tracing::Span::current();
    span.record("dispatched", dispatched);
    span.record("stopped_by", stopped_by);

    // Workers hold their own clones of the output sender; ours goes now so the
    // downstream reader sees the channel close once the last worker is done.
    drop(ctx);
    drop(input);

    tracing::debug!(in_flight = in_flight.count(), "waiting for all workers to terminate");
    in_flight.wait_idle().await;
    tracing::debug!("all workers terminated");
    telemetry::record_run_duration(started.elapsed());
}
