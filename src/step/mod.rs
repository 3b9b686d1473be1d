//! Pipeline step contract.
//!
//! A step consumes targets from an input channel and forwards them to an
//! output channel while observing the run's [`ControlSignals`].

mod error;
mod inflight;
mod params;
mod registry;

pub use error::StepError;
pub use inflight::{InFlightGuard, InFlightTracker};
pub use params::{Param, StepParameters};
pub use registry::{RegistryError, StepFactory, StepRegistry};

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::event::EventEmitter;
use crate::signal::ControlSignals;
use crate::target::Target;

/// Input and output ends handed to a step for one run.
///
/// The input is exhausted when every sender has been dropped; that is the
/// end-of-stream marker, distinct from a pending `recv`.
#[derive(Debug)]
pub struct StepChannels {
    pub input: mpsc::Receiver<Target>,
    pub output: mpsc::Sender<Target>,
}

impl StepChannels {
    pub fn new(input: mpsc::Receiver<Target>, output: mpsc::Sender<Target>) -> Self {
        Self { input, output }
    }
}

/// A unit of a target-processing pipeline.
#[async_trait]
pub trait TestStep: Send + Sync {
    /// Name used for registry lookup and logging.
    fn name(&self) -> &str;

    /// Check parameters before any target is processed.
    fn validate_parameters(&self, params: &StepParameters) -> Result<(), StepError>;

    /// Process targets until the input ends or a control signal fires.
    ///
    /// Must not return while work it started is still running.
    async fn run(
        &self,
        signals: &ControlSignals,
        channels: StepChannels,
        params: &StepParameters,
        emitter: Arc<dyn EventEmitter>,
    ) -> Result<(), StepError>;

    /// Whether [`resume`](Self::resume) can continue an interrupted run.
    fn can_resume(&self) -> bool;

    /// Continue a previously interrupted run.
    async fn resume(
        &self,
        signals: &ControlSignals,
        channels: StepChannels,
        params: &StepParameters,
        emitter: Arc<dyn EventEmitter>,
    ) -> Result<(), StepError>;
}
