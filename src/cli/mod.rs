//! CLI subcommands for slowecho.
//!
//! ## Usage
//!
//! ```bash
//! printf 'host-a\nhost-b\n' | slowecho-cli run --text hello --sleep 1
//! slowecho-cli validate --text hello --sleep -1   # exits 2
//! slowecho-cli config show
//! ```

pub mod config_cmd;
pub mod run_cmd;

pub use run_cmd::{parse_step_args, run, run_validate, StepArgs};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
/// Parameters or configuration rejected before any target was read.
pub const EXIT_CONFIG: i32 = 2;
