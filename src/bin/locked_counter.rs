//! Increments a single lock-protected counter from many threads.
//!
//! Usage: `locked-counter <num_threads> <increments_per_thread>`

use std::process::ExitCode;

use sloppy::cli::{run_main, Profile};

fn main() -> ExitCode {
    run_main(Profile::LOCKED)
}
