//! Increments a sloppy counter with one shard per CPU core, pinning each
//! worker to a core.
//!
//! Usage: `sloppy-counter-cpu <num_threads> <increments_per_thread>`

use std::process::ExitCode;

use sloppy::cli::{run_main, Profile};

fn main() -> ExitCode {
    run_main(Profile::CPU)
}
