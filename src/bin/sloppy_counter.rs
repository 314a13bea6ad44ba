//! Increments a sloppy counter from many threads, each through its own
//! unlocked tally.
//!
//! Usage: `sloppy-counter <num_threads> <increments_per_thread>`

use std::process::ExitCode;

use sloppy::cli::{run_main, Profile};

fn main() -> ExitCode {
    run_main(Profile::PER_THREAD)
}
