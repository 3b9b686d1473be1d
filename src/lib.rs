//! slowecho
//!
//! A pipeline step that delays every target by a configured number of
//! seconds, echoes a configured text for it, and forwards it downstream,
//! while honouring cooperative cancel and pause signals.
//!
//! # Behaviour
//!
//! - **Concurrent**: one worker task per target; the dispatch loop never
//!   waits on a worker before reading the next target.
//! - **Interruptible**: cancel or pause stops dispatching and drops every
//!   target still waiting out its delay.
//! - **Drained**: `run` returns only after every worker has finished.
//! - **Not resumable**: an interrupted run is restarted, never continued.
//!
//! Alongside the step, [`storage`] keeps submitted job requests (the job
//! descriptors that name steps like SlowEcho) behind an emit/fetch API with
//! an in-memory backend.

pub mod cli;
pub mod config;
pub mod event;
pub mod signal;
pub mod slowecho;
pub mod step;
pub mod storage;
pub mod target;
pub mod telemetry;

pub use event::{EventEmitter, EventName, MemoryEmitter, TestEvent, TracingEmitter};
pub use signal::{ControlSignals, Interrupt};
pub use slowecho::{SlowEcho, SlowEchoParams};
pub use step::{StepChannels, StepError, StepParameters, StepRegistry, TestStep};
pub use target::Target;
