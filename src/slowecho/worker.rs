//! Per-target delay worker.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::event::{EventEmitter, TestEvent};
use crate::signal::ControlSignals;
use crate::step::InFlightGuard;
use crate::target::Target;
use crate::telemetry::{self, DropReason};

use super::{SlowEcho, SlowEchoParams, TARGET_ECHOED};

/// State shared by every worker of one run.
pub(super) struct WorkerContext {
    pub params: SlowEchoParams,
    pub signals: ControlSignals,
    pub output: mpsc::Sender<Target>,
    pub emitter: Arc<dyn EventEmitter>,
}

/// What happened to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Outcome {
    Forwarded,
    Dropped(DropReason),
}

/// Delay, echo, then forward one target unless a control signal wins.
///
/// The guard is released last: once the run has drained, no worker holds an
/// output sender anymore.
pub(super) async fn echo(ctx: Arc<WorkerContext>, target: Target, guard: InFlightGuard) -> Outcome {
    let outcome = delay_and_forward(&ctx, target).await;
    match outcome {
        Outcome::Forwarded => telemetry::record_target_forwarded(),
        Outcome::Dropped(reason) => telemetry::record_target_dropped(reason),
    }
    tracing::Span::current().record("outcome", format!("{outcome:?}").as_str());
    drop(ctx);
    drop(guard);
    outcome
}

async fn delay_and_forward(ctx: &WorkerContext, target: Target) -> Outcome {
    tracing::info!(sleep = ?ctx.params.sleep, "waiting {:?} for target {}", ctx.params.sleep, target.name);

    tokio::select! {
        biased;
        interrupt = ctx.signals.interrupted() => {
            tracing::info!(%interrupt, "returning before echo, control signal fired");
            return Outcome::Dropped(DropReason::Interrupted(interrupt));
        }
        () = tokio::time::sleep(ctx.params.sleep) => {}
    }

    tracing::info!("target {}: {}", target, ctx.params.text);
    let event = TestEvent::new(SlowEcho::NAME, TARGET_ECHOED, target.clone(), &ctx.params.text);
    if let Err(e) = ctx.emitter.emit(event) {
        telemetry::record_event_failure();
        tracing::warn!(error = %e, "could not emit echo event");
    }

    // A full output channel must not pin the worker once a signal fires.
    tokio::select! {
        biased;
        interrupt = ctx.signals.interrupted() => {
            tracing::debug!(%interrupt, "returning without forwarding, control signal fired");
            Outcome::Dropped(DropReason::Interrupted(interrupt))
        }
        sent = ctx.output.send(target) => match sent {
            Ok(()) => Outcome::Forwarded,
            Err(mpsc::error::SendError(target)) => {
                tracing::warn!(%target, "output channel closed, target not forwarded");
                Outcome::Dropped(DropReason::OutputClosed)
            }
        },
    }
}
