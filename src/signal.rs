//! Cooperative control signals shared by a step and all of its workers.
//!
//! Both signals are broadcast, fire at most once and never reset for the
//! lifetime of a run. Observing a signal does not consume it.

use std::fmt;

use tokio_util::sync::CancellationToken;

/// Which control signal interrupted processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Cancel,
    Pause,
}

impl Interrupt {
    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cancel => "cancelled",
            Self::Pause => "paused",
        }
    }
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The cancel/pause pair raised by the orchestrator.
///
/// Cloning is cheap and every clone observes the same two signals.
#[derive(Debug, Clone, Default)]
pub struct ControlSignals {
    cancel: CancellationToken,
    pause: CancellationToken,
}

impl ControlSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Request pause. Idempotent.
    pub fn pause(&self) {
        self.pause.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_cancelled()
    }

    /// Non-blocking query. Cancel is reported when both have fired.
    pub fn fired(&self) -> Option<Interrupt> {
        if self.is_cancelled() {
            Some(Interrupt::Cancel)
        } else if self.is_paused() {
            Some(Interrupt::Pause)
        } else {
            None
        }
    }

    /// Resolve once either signal has fired.
    pub async fn interrupted(&self) -> Interrupt {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Interrupt::Cancel,
            () = self.pause.cancelled() => Interrupt::Pause,
        }
    }
}
