//! `run` and `validate` subcommands.
//!
//! `run` feeds one target per stdin line into a step and prints every
//! forwarded target name on stdout. Ctrl-C fires cancel; on Unix, SIGUSR1
//! fires pause.

use std::io::BufRead;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config;
use crate::event::{DeclaredEmitter, EventEmitter, TracingEmitter};
use crate::signal::ControlSignals;
use crate::slowecho::{SlowEcho, SLEEP, TEXT};
use crate::step::{StepChannels, StepError, StepParameters, StepRegistry};
use crate::target::Target;
use crate::telemetry;

use super::{EXIT_CONFIG, EXIT_FAILURE, EXIT_SUCCESS};

/// Parsed `run`/`validate` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepArgs {
    pub step: String,
    pub params: StepParameters,
}

/// Parse `[--step NAME] [--params FILE] [--text T] [--sleep N]`.
///
/// `args` excludes the program name and subcommand. Flags override values
/// loaded from `--params`.
pub fn parse_step_args(args: &[String]) -> Result<StepArgs, String> {
    let mut step = SlowEcho::NAME.to_string();
    let mut params = StepParameters::new();
    let mut overrides: Vec<(&str, String)> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = || {
            args.get(i + 1)
                .cloned()
                .ok_or_else(|| format!("Missing value for {flag}"))
        };
        match flag {
            "--step" => step = value()?,
            "--params" => {
                let path = value()?;
                let json = std::fs::read_to_string(&path)
                    .map_err(|e| format!("Cannot read {path}: {e}"))?;
                params = StepParameters::from_json(&json)
                    .map_err(|e| format!("Invalid parameters file {path}: {e}"))?;
            }
            "--text" => overrides.push((TEXT, value()?)),
            "--sleep" => overrides.push((SLEEP, value()?)),
            _ => return Err(format!("Unknown argument: {flag}")),
        }
        i += 2;
    }

    for (name, value) in overrides {
        params.set(name, value);
    }
    Ok(StepArgs { step, params })
}

/// Validate step parameters without running anything.
pub fn run_validate(args: &[String]) -> i32 {
    let parsed = match parse_step_args(args) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("{msg}");
            return EXIT_FAILURE;
        }
    };
    match validate(&StepRegistry::with_builtin(), &parsed) {
        Ok(()) => {
            println!("Parameters for {} are valid.", parsed.step);
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Invalid parameters: {e}");
            EXIT_CONFIG
        }
    }
}

fn validate(registry: &StepRegistry, parsed: &StepArgs) -> Result<(), StepError> {
    let step = registry
        .create(&parsed.step)
        .ok_or_else(|| StepError::UnknownStep(parsed.step.clone()))?;
    step.validate_parameters(&parsed.params)
}

/// Run a step over stdin until end of input or a control signal.
pub async fn run(args: &[String]) -> i32 {
    let parsed = match parse_step_args(args) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("{msg}");
            return EXIT_FAILURE;
        }
    };

    let env = config::load();
    if let Err(e) = telemetry::init_logging(&env) {
        eprintln!("Logging setup failed: {e}");
        return EXIT_FAILURE;
    }

    let registry = StepRegistry::with_builtin();
    if let Err(e) = validate(&registry, &parsed) {
        eprintln!("Invalid parameters: {e}");
        return EXIT_CONFIG;
    }
    let Some(step) = registry.create(&parsed.step) else {
        return EXIT_CONFIG;
    };
    let events = registry.events(&parsed.step).unwrap_or(&[]);
    let emitter: Arc<dyn EventEmitter> = Arc::new(DeclaredEmitter::new(TracingEmitter, events));

    let signals = ControlSignals::new();
    let (input_tx, input_rx) = mpsc::channel(env.channel_capacity);
    let (output_tx, output_rx) = mpsc::channel(env.channel_capacity);

    let handlers = spawn_signal_handlers(&signals);
    spawn_stdin_reader(input_tx);
    let printer = tokio::spawn(print_forwarded(output_rx));

    let result = step
        .run(
            &signals,
            StepChannels::new(input_rx, output_tx),
            &parsed.params,
            emitter,
        )
        .await;

    for handle in handlers {
        handle.abort();
    }
    let Some(forwarded) = join_printer(printer).await else {
        // Forwarded targets may have been lost, whatever the step reported.
        return EXIT_FAILURE;
    };

    match result {
        Ok(()) => {
            tracing::info!(
                step = %parsed.step,
                forwarded,
                interrupted = ?signals.fired(),
                "run complete"
            );
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Run failed: {e}");
            if e.is_configuration() {
                EXIT_CONFIG
            } else {
                EXIT_FAILURE
            }
        }
    }
}

/// Read target names from stdin on a plain thread so a pending read never
/// holds up runtime shutdown. Blank lines are skipped.
fn spawn_stdin_reader(tx: mpsc::Sender<Target>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for (n, line) in stdin.lock().lines().enumerate() {
            let Ok(line) = line else { break };
            let name = line.trim();
            if name.is_empty() {
                continue;
            }
            if tx.blocking_send(Target::new((n + 1).to_string(), name)).is_err() {
                break;
            }
        }
    });
}

async fn print_forwarded(mut rx: mpsc::Receiver<Target>) -> usize {
    let mut count = 0;
    while let Some(target) = rx.recv().await {
        println!("{}", target.name);
        count += 1;
    }
    count
}

/// Wait for the stdout printer. `None` if it panicked or was aborted.
async fn join_printer(printer: JoinHandle<usize>) -> Option<usize> {
    match printer.await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!(error = %e, "output printer did not finish");
            None
        }
    }
}

fn spawn_signal_handlers(signals: &ControlSignals) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();

    let cancel = signals.clone();
    handles.push(tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling");
            cancel.cancel();
        }
    }));

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let pause = signals.clone();
        handles.push(tokio::spawn(async move {
            match signal(SignalKind::user_defined1()) {
                Ok(mut usr1) => {
                    if usr1.recv().await.is_some() {
                        tracing::info!("SIGUSR1 received, pausing");
                        pause.pause();
                    }
                }
                Err(e) => tracing::warn!(error = %e, "cannot install SIGUSR1 handler"),
            }
        }));
    }

    handles
}
