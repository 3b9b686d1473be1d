//! End-to-end tests for the SlowEcho step: delay, echo, forward, and the
//! cancel/pause/drain behaviour of a run.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use slowecho::event::{EmitError, EventEmitter, MemoryEmitter, TestEvent};
use slowecho::signal::{ControlSignals, Interrupt};
use slowecho::slowecho::{SlowEcho, TARGET_ECHOED};
use slowecho::step::{StepChannels, StepError, StepParameters, StepRegistry, TestStep};
use slowecho::target::Target;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const RUN_TIMEOUT: Duration = Duration::from_secs(5);

fn params(text: &str, sleep: &str) -> StepParameters {
    StepParameters::new().with("text", text).with("sleep", sleep)
}

fn targets(n: usize) -> Vec<Target> {
    (1..=n)
        .map(|i| Target::new(i.to_string(), format!("host-{i}")))
        .collect()
}

struct Harness {
    signals: ControlSignals,
    input: Option<mpsc::Sender<Target>>,
    output: mpsc::Receiver<Target>,
    emitter: Arc<MemoryEmitter>,
    run: JoinHandle<Result<(), StepError>>,
}

impl Harness {
    fn start(params: StepParameters, capacity: usize) -> Self {
        Self::start_with(params, capacity, ControlSignals::new(), Vec::new())
    }

    /// Start a run with `queued` already waiting on the input channel.
    fn start_with(
        params: StepParameters,
        capacity: usize,
        signals: ControlSignals,
        queued: Vec<Target>,
    ) -> Self {
        let (input_tx, input_rx) = mpsc::channel(capacity.max(queued.len()).max(1));
        let (output_tx, output_rx) = mpsc::channel(capacity);
        for t in queued {
            input_tx.try_send(t).unwrap();
        }
        let memory = Arc::new(MemoryEmitter::new());
        let emitter: Arc<dyn EventEmitter> = memory.clone();

        let run = tokio::spawn({
            let signals = signals.clone();
            async move {
                SlowEcho::new()
                    .run(&signals, StepChannels::new(input_rx, output_tx), &params, emitter)
                    .await
            }
        });

        Self {
            signals,
            input: Some(input_tx),
            output: output_rx,
            emitter: memory,
            run,
        }
    }

    async fn send(&self, targets: Vec<Target>) {
        let input = self.input.as_ref().unwrap();
        for t in targets {
            input.send(t).await.unwrap();
        }
    }

    fn end_input(&mut self) {
        self.input = None;
    }

    async fn finish(&mut self) -> Result<(), StepError> {
        let run = &mut self.run;
        tokio::time::timeout(RUN_TIMEOUT, run)
            .await
            .expect("run did not return in time")
            .expect("run task panicked")
    }

    /// Collect everything forwarded. Only valid after the run has returned.
    fn forwarded(&mut self) -> Vec<Target> {
        let mut out = Vec::new();
        while let Ok(t) = self.output.try_recv() {
            out.push(t);
        }
        out
    }

    /// True once every sender of the output channel is gone, i.e. no worker
    /// is alive anymore.
    fn output_disconnected(&mut self) -> bool {
        matches!(
            self.output.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        )
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn three_targets_are_forwarded_after_delay() {
    let mut h = Harness::start(params("hello", "1"), 16);
    let start = Instant::now();
    h.send(targets(3)).await;
    h.end_input();

    h.finish().await.unwrap();
    let elapsed = start.elapsed();

    let forwarded = h.forwarded();
    assert!(h.output_disconnected());
    let names: HashSet<String> = forwarded.iter().map(|t| t.name.clone()).collect();
    let expected: HashSet<String> = targets(3).into_iter().map(|t| t.name).collect();
    assert_eq!(forwarded.len(), 3);
    assert_eq!(names, expected);

    assert!(elapsed >= Duration::from_secs(1), "forwarded before the delay: {elapsed:?}");
    // Delays run concurrently, not one after another.
    assert!(elapsed < Duration::from_millis(2500), "targets were serialized: {elapsed:?}");

    let events = h.emitter.events();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.name == TARGET_ECHOED && e.payload == "hello"));
    assert!(events.iter().all(|e| e.step == SlowEcho::NAME));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn zero_sleep_forwards_without_delay() {
    let mut h = Harness::start(params("fast", "0"), 16);
    let start = Instant::now();
    h.send(targets(5)).await;
    h.end_input();

    h.finish().await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(h.forwarded().len(), 5);
    assert_eq!(h.emitter.len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn empty_input_returns_immediately() {
    let mut h = Harness::start(params("idle", "5"), 4);
    h.end_input();

    let start = Instant::now();
    h.finish().await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(h.forwarded().is_empty());
    assert!(h.emitter.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancel_during_delay_drops_target_promptly() {
    let mut h = Harness::start(params("slow", "5"), 4);
    h.send(targets(1)).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let start = Instant::now();
    h.signals.cancel();
    h.finish().await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(1), "run waited out the delay");
    assert!(h.forwarded().is_empty());
    assert!(h.emitter.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pause_drains_all_in_flight_workers() {
    let mut h = Harness::start(params("slow", "5"), 8);
    h.send(targets(4)).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    h.signals.pause();
    h.finish().await.unwrap();

    // Every worker has dropped its output sender by the time run returns.
    assert!(h.output_disconnected());
    assert!(h.emitter.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn targets_queued_after_cancel_are_never_dispatched() {
    let signals = ControlSignals::new();
    signals.cancel();
    let mut h = Harness::start_with(params("never", "0"), 8, signals, targets(3));

    h.finish().await.unwrap();
    assert!(h.output_disconnected());
    assert!(h.emitter.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn targets_queued_after_pause_are_never_dispatched() {
    let signals = ControlSignals::new();
    signals.pause();
    let mut h = Harness::start_with(params("never", "0"), 8, signals, targets(3));

    h.finish().await.unwrap();
    assert!(h.output_disconnected());
    assert!(h.emitter.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn run_waits_for_workers_after_end_of_input() {
    let mut h = Harness::start(params("wait", "1"), 8);
    h.send(targets(2)).await;
    h.end_input();

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!h.run.is_finished(), "run returned before its workers finished");

    h.finish().await.unwrap();
    assert_eq!(h.forwarded().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancel_racing_forward_only_forwards_echoed_targets() {
    let mut h = Harness::start(params("race", "1"), 16);
    h.send(targets(10)).await;

    tokio::time::sleep(Duration::from_millis(1000)).await;
    h.signals.cancel();
    h.finish().await.unwrap();

    let forwarded: Vec<String> = h.forwarded().into_iter().map(|t| t.name).collect();
    assert!(h.output_disconnected());
    let echoed: Vec<String> = h.emitter.events().into_iter().map(|e| e.target.name).collect();

    let forwarded_set: HashSet<&String> = forwarded.iter().collect();
    let echoed_set: HashSet<&String> = echoed.iter().collect();
    assert_eq!(forwarded_set.len(), forwarded.len(), "target forwarded twice: {forwarded:?}");
    assert_eq!(echoed_set.len(), echoed.len(), "target echoed twice: {echoed:?}");
    assert!(echoed.len() <= 10);
    // Nothing reaches the output without its echo first.
    assert!(
        forwarded_set.is_subset(&echoed_set),
        "forwarded {forwarded:?} but echoed {echoed:?}"
    );
    let dropped_after_echo = echoed_set.difference(&forwarded_set).count();
    assert_eq!(echoed.len(), forwarded.len() + dropped_after_echo);
}

fn fire(signals: &ControlSignals, interrupt: Interrupt) {
    match interrupt {
        Interrupt::Cancel => signals.cancel(),
        Interrupt::Pause => signals.pause(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn targets_sent_after_mid_run_signal_are_never_echoed() {
    for interrupt in [Interrupt::Cancel, Interrupt::Pause] {
        let mut h = Harness::start(params("late", "0"), 8);
        h.send(vec![Target::new("0", "early")]).await;
        let first = tokio::time::timeout(RUN_TIMEOUT, h.output.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.name, "early");

        fire(&h.signals, interrupt);
        // The run may already have dropped its input; late sends then fail.
        let input = h.input.take().unwrap();
        for t in targets(3) {
            let _ = input.try_send(t);
        }
        drop(input);

        h.finish().await.unwrap();
        assert!(h.output_disconnected(), "late target forwarded after {interrupt}");
        let echoed: Vec<String> = h.emitter.events().into_iter().map(|e| e.target.name).collect();
        assert_eq!(echoed, vec!["early".to_string()], "late target echoed after {interrupt}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn each_target_is_delayed_from_its_own_dispatch() {
    let mut h = Harness::start(params("staggered", "1"), 8);
    let sent_first = Instant::now();
    h.send(vec![Target::new("a", "first")]).await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    let sent_second = Instant::now();
    h.send(vec![Target::new("b", "second")]).await;
    h.end_input();

    let mut arrivals = Vec::new();
    for _ in 0..2 {
        let target = tokio::time::timeout(RUN_TIMEOUT, h.output.recv())
            .await
            .unwrap()
            .unwrap();
        arrivals.push((target.name, Instant::now()));
    }
    h.finish().await.unwrap();

    assert_eq!(arrivals[0].0, "first");
    assert_eq!(arrivals[1].0, "second");
    let first = arrivals[0].1 - sent_first;
    let second = arrivals[1].1 - sent_second;
    assert!(first >= Duration::from_secs(1), "first forwarded early: {first:?}");
    assert!(second >= Duration::from_secs(1), "second forwarded early: {second:?}");
    assert!(
        arrivals[1].1 - sent_first >= Duration::from_millis(1500),
        "second delay measured from run start"
    );
    assert!(second < Duration::from_millis(1400), "second waited on the first: {second:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn blocked_forward_is_released_by_cancel() {
    // Output holds a single target and nobody reads it.
    let mut h = Harness::start(params("full", "0"), 1);
    h.send(targets(3)).await;
    h.end_input();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!h.run.is_finished(), "workers should be waiting on the full output");

    h.signals.cancel();
    h.finish().await.unwrap();

    assert_eq!(h.forwarded().len(), 1);
    assert!(h.output_disconnected());
    assert_eq!(h.emitter.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn closed_output_does_not_fail_run() {
    let (input_tx, input_rx) = mpsc::channel(4);
    let (output_tx, output_rx) = mpsc::channel(4);
    drop(output_rx);
    for t in targets(2) {
        input_tx.send(t).await.unwrap();
    }
    drop(input_tx);

    let emitter = Arc::new(MemoryEmitter::new());
    let result = SlowEcho::new()
        .run(
            &ControlSignals::new(),
            StepChannels::new(input_rx, output_tx),
            &params("gone", "0"),
            emitter.clone(),
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(emitter.len(), 2);
}

struct FailingEmitter;

impl EventEmitter for FailingEmitter {
    fn emit(&self, _event: TestEvent) -> Result<(), EmitError> {
        Err(EmitError::Sink("disk full".into()))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn emitter_failure_is_not_fatal() {
    let (input_tx, input_rx) = mpsc::channel(4);
    let (output_tx, mut output_rx) = mpsc::channel(4);
    for t in targets(2) {
        input_tx.send(t).await.unwrap();
    }
    drop(input_tx);

    let result = SlowEcho::new()
        .run(
            &ControlSignals::new(),
            StepChannels::new(input_rx, output_tx),
            &params("x", "0"),
            Arc::new(FailingEmitter),
        )
        .await;

    assert!(result.is_ok());
    let mut forwarded = 0;
    while output_rx.recv().await.is_some() {
        forwarded += 1;
    }
    assert_eq!(forwarded, 2);
}

#[tokio::test]
async fn invalid_parameters_fail_before_processing() {
    for bad in [
        params("x", "-1"),
        params("x", "soon"),
        StepParameters::new().with("sleep", "1"),
        StepParameters::new().with("text", "x"),
    ] {
        let signals = ControlSignals::new();
        let mut h = Harness::start_with(bad, 4, signals, targets(2));
        let err = h.finish().await.unwrap_err();
        assert!(err.is_configuration(), "unexpected error: {err}");
        assert!(h.emitter.is_empty());
        assert!(h.output_disconnected());
    }
}

#[test]
fn validate_parameters_matches_run_validation() {
    let step = SlowEcho::new();
    assert!(step.validate_parameters(&params("hello", "0")).is_ok());
    assert!(step.validate_parameters(&params("hello", "30")).is_ok());

    let err = step.validate_parameters(&params("hello", "-1")).unwrap_err();
    assert!(matches!(err, StepError::InvalidParameter { name: "sleep", .. }));

    let err = step.validate_parameters(&params("", "1")).unwrap_err();
    assert!(matches!(err, StepError::MissingParameter { name: "text", .. }));
}

#[tokio::test]
async fn resume_is_never_supported() {
    let step = SlowEcho::new();
    assert!(!step.can_resume());

    for _ in 0..2 {
        let (_input_tx, input_rx) = mpsc::channel(1);
        let (output_tx, _output_rx) = mpsc::channel(1);
        let err = step
            .resume(
                &ControlSignals::new(),
                StepChannels::new(input_rx, output_tx),
                &params("x", "0"),
                Arc::new(MemoryEmitter::new()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::ResumeNotSupported { ref step_name } if step_name == SlowEcho::NAME));
        assert!(!err.is_configuration());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn registry_step_runs_as_trait_object() {
    let registry = StepRegistry::with_builtin();
    let step: Box<dyn TestStep> = registry.create(SlowEcho::NAME).unwrap();

    let (input_tx, input_rx) = mpsc::channel(4);
    let (output_tx, mut output_rx) = mpsc::channel(4);
    input_tx.send(Target::new("7", "host-7")).await.unwrap();
    drop(input_tx);

    step.run(
        &ControlSignals::new(),
        StepChannels::new(input_rx, output_tx),
        &params("boxed", "0"),
        Arc::new(MemoryEmitter::new()),
    )
    .await
    .unwrap();

    assert_eq!(output_rx.recv().await, Some(Target::new("7", "host-7")));
    assert_eq!(output_rx.recv().await, None);
}
