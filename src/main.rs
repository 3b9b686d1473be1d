//! slowecho CLI entry point.
//!
//! ## Subcommands
//!
//! - `slowecho-cli run` - Run a step over targets read from stdin
//! - `slowecho-cli validate` - Validate step parameters (exit 0/2)
//! - `slowecho-cli config show|defaults` - Print configuration
//! - `slowecho-cli steps` - List registered steps

use std::process::ExitCode;

use slowecho::cli::{self, config_cmd};
use slowecho::StepRegistry;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");
    let rest = args.get(2..).unwrap_or(&[]);

    match command {
        "run" => ExitCode::from(cli::run(rest).await as u8),
        "validate" => ExitCode::from(cli::run_validate(rest) as u8),
        "steps" => {
            let registry = StepRegistry::with_builtin();
            for name in registry.names() {
                let events = registry.events(name).unwrap_or(&[]);
                let events: Vec<&str> = events.iter().map(|e| e.as_str()).collect();
                println!("{name}\tevents: {}", events.join(","));
            }
            ExitCode::SUCCESS
        }
        "config" => {
            let subcommand = rest.first().map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    config_cmd::run_show();
                    ExitCode::SUCCESS
                }
                "defaults" => {
                    config_cmd::run_defaults();
                    ExitCode::SUCCESS
                }
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_usage();
                    ExitCode::FAILURE
                }
            }
        }
        "version" | "--version" | "-V" => {
            println!("slowecho {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "slowecho v{}

USAGE:
    slowecho-cli <COMMAND> [OPTIONS]

COMMANDS:
    run          Read targets (one per line) from stdin, echo and forward them
    validate     Check step parameters and exit
    steps        List registered steps and their events
    config       Print configuration (show, defaults)
    version      Show version information
    help         Show this help message

RUN / VALIDATE OPTIONS:
    --step NAME    Step to run (default: SlowEcho)
    --params FILE  JSON parameters, e.g. {{\"text\": [\"hi\"], \"sleep\": [\"1\"]}}
    --text TEXT    Text echoed for each target
    --sleep SECS   Per-target delay in whole seconds (>= 0)

SIGNALS (run):
    Ctrl-C   cancel: stop reading, drop targets still waiting
    SIGUSR1  pause (Unix only): same as cancel, reported as pause

ENVIRONMENT:
    SLOWECHO_LOG_LEVEL         Log filter (default: info)
    SLOWECHO_LOG_FORMAT        json or pretty (default: json)
    SLOWECHO_LOG_FILE          Write JSON logs to this file
    SLOWECHO_CHANNEL_CAPACITY  Channel capacity (default: 64)

EXIT CODES:
    0  Success
    1  Failure / usage error
    2  Invalid parameters or configuration
",
        version
    );
}
