//! Command line front end shared by the binaries.
//!
//! Every counter program takes the same two positionals,
//! `<num_threads> <increments_per_thread>`, and differs only in its
//! [`Profile`]: which counter it exercises by default, how it shards, and how
//! it prints elapsed time.
//!
//! Usage errors exit with status 1 before any worker is spawned.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, ValueEnum};
use tracing::{error, info};

use crate::counters::DEFAULT_THRESHOLD;
use crate::logging::init_tracing;
use crate::observers::json::JsonObserver;
use crate::observers::table::{TableObserver, TableStyle};
use crate::observers::text::{TextObserver, TimeUnit};
use crate::observers::{self, ObserverError};
use crate::runner::{self, RunConfig, RunResult, Strategy, MAX_WORKERS};
use crate::sharding::ShardingMode;

/// Counter selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyChoice {
    /// One global lock
    Locked,
    /// Locked shards flushing into a global accumulator
    Sloppy,
    /// Thread-owned tallies flushing into a global accumulator
    PerThread,
}

impl From<StrategyChoice> for Strategy {
    fn from(choice: StrategyChoice) -> Self {
        match choice {
            StrategyChoice::Locked => Strategy::Locked,
            StrategyChoice::Sloppy => Strategy::Sloppy,
            StrategyChoice::PerThread => Strategy::PerThread,
        }
    }
}

/// Sharding selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ShardingChoice {
    /// Worker index modulo shard count
    Logical,
    /// Pin workers to cores and shard by core
    Cpu,
}

impl From<ShardingChoice> for ShardingMode {
    fn from(choice: ShardingChoice) -> Self {
        match choice {
            ShardingChoice::Logical => ShardingMode::Logical,
            ShardingChoice::Cpu => ShardingMode::CpuAffinity,
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text lines
    Text,
    /// ASCII table, one row per run
    Table,
    /// JSON
    Json,
}

/// Table style selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum StyleChoice {
    Ascii,
    #[default]
    Rounded,
    Sharp,
    Markdown,
    Blank,
}

impl From<StyleChoice> for TableStyle {
    fn from(choice: StyleChoice) -> Self {
        match choice {
            StyleChoice::Ascii => TableStyle::Ascii,
            StyleChoice::Rounded => TableStyle::Rounded,
            StyleChoice::Sharp => TableStyle::Sharp,
            StyleChoice::Markdown => TableStyle::Markdown,
            StyleChoice::Blank => TableStyle::Blank,
        }
    }
}

/// Options shared by every binary.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Counter to exercise (defaults to the program's own)
    #[arg(long, value_enum)]
    strategy: Option<StrategyChoice>,

    /// How workers are mapped onto shards (defaults to the program's own)
    #[arg(long, value_enum)]
    sharding: Option<ShardingChoice>,

    /// Number of shards (defaults to one per online CPU)
    #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    shards: Option<usize>,

    /// Local count at which a shard flushes into the global counter
    #[arg(long, default_value_t = DEFAULT_THRESHOLD, value_parser = clap::value_parser!(u64).range(1..))]
    threshold: u64,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,

    /// Border style of table output
    #[arg(long, value_enum, default_value_t)]
    style: StyleChoice,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Parser for thread counts: between 1 and [`MAX_WORKERS`].
fn thread_count() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::new().range(1..=MAX_WORKERS as u64)
}

impl CommonArgs {
    fn config(&self, workers: usize, increments: u64, profile: &Profile) -> RunConfig {
        let mut config = RunConfig::new(workers, increments)
            .with_strategy(self.strategy.map_or(profile.strategy, Strategy::from))
            .with_sharding(self.sharding.map_or(profile.sharding, ShardingMode::from))
            .with_threshold(self.threshold);
        if let Some(shards) = self.shards {
            config = config.with_shards(shards);
        }
        config
    }

    fn output(&self, profile: &Profile) -> Output {
        Output {
            format: self.format.unwrap_or(profile.format),
            pretty: self.pretty,
            style: self.style.into(),
            unit: profile.unit,
        }
    }
}

/// Run the counter benchmark once.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct RunArgs {
    /// Number of worker threads
    #[arg(value_parser = thread_count())]
    num_threads: usize,

    /// Increments performed by each thread
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    increments_per_thread: u64,

    #[command(flatten)]
    common: CommonArgs,
}

/// Run the counter benchmark for every thread count in a range, splitting a
/// fixed amount of work between the threads.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct SweepArgs {
    /// Smallest number of threads
    #[arg(value_parser = thread_count())]
    min_threads: usize,

    /// Largest number of threads
    #[arg(value_parser = thread_count())]
    max_threads: usize,

    /// Total increments per run, divided evenly between the threads
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    total_increments: u64,

    #[command(flatten)]
    common: CommonArgs,
}

/// Defaults that distinguish one counter program from another.
#[derive(Debug, Clone, Copy)]
pub struct Profile {
    /// Counter exercised unless `--strategy` is given.
    pub strategy: Strategy,
    /// Sharding used unless `--sharding` is given.
    pub sharding: ShardingMode,
    /// Unit of the text report.
    pub unit: TimeUnit,
    /// Format used unless `--format` is given.
    pub format: OutputFormat,
}

impl Profile {
    /// The global-lock program: reports seconds.
    pub const LOCKED: Profile = Profile {
        strategy: Strategy::Locked,
        sharding: ShardingMode::Logical,
        unit: TimeUnit::Seconds,
        format: OutputFormat::Text,
    };

    /// The per-thread sloppy program.
    pub const PER_THREAD: Profile = Profile {
        strategy: Strategy::PerThread,
        sharding: ShardingMode::Logical,
        unit: TimeUnit::Millis,
        format: OutputFormat::Text,
    };

    /// The sharded sloppy program, one shard per core.
    pub const CPU: Profile = Profile {
        strategy: Strategy::Sloppy,
        sharding: ShardingMode::CpuAffinity,
        unit: TimeUnit::Millis,
        format: OutputFormat::Text,
    };

    /// The thread-count sweep.
    pub const SWEEP: Profile = Profile {
        strategy: Strategy::Sloppy,
        sharding: ShardingMode::Logical,
        unit: TimeUnit::Millis,
        format: OutputFormat::Table,
    };
}

/// Entry point of the single-run programs.
pub fn run_main(profile: Profile) -> ExitCode {
    let args = match RunArgs::try_parse() {
        Ok(args) => args,
        Err(err) => return usage_exit(err),
    };
    init_tracing(args.common.verbose);

    let config = args
        .common
        .config(args.num_threads, args.increments_per_thread, &profile);
    let result = match runner::execute(&config) {
        Ok(result) => result,
        Err(err) => return fail(&err),
    };

    finish(args.common.output(&profile).render_run(&result))
}

/// Entry point of the sweep program.
pub fn sweep_main(profile: Profile) -> ExitCode {
    let args = match SweepArgs::try_parse() {
        Ok(args) => args,
        Err(err) => return usage_exit(err),
    };
    init_tracing(args.common.verbose);

    let template = args.common.config(args.min_threads, 1, &profile);
    let results = match runner::sweep(
        &template,
        args.min_threads..=args.max_threads,
        args.total_increments,
    ) {
        Ok(results) => results,
        Err(err) => return fail(&err),
    };

    let title = format!(
        "{} counter, {} increments per run",
        template.strategy, args.total_increments
    );
    finish(args.common.output(&profile).render_sweep(&title, &results))
}

/// How results are printed.
#[derive(Debug, Clone, Copy)]
struct Output {
    format: OutputFormat,
    pretty: bool,
    style: TableStyle,
    unit: TimeUnit,
}

impl Output {
    /// Renders one run. A sharded run over pinned cores is headed by its
    /// shard count in text output only, so JSON and table output stay
    /// parseable.
    fn render_run(&self, result: &RunResult) -> observers::Result<String> {
        let per_core =
            result.sharding == ShardingMode::CpuAffinity && result.strategy == Strategy::Sloppy;
        if per_core {
            info!(cores = result.shards, "one shard per core");
        }

        match self.format {
            OutputFormat::Text => {
                let report = TextObserver::new().with_unit(self.unit).render(result);
                if per_core {
                    Ok(format!("System has {} CPU cores\n{report}", result.shards))
                } else {
                    Ok(report)
                }
            }
            OutputFormat::Table => Ok(TableObserver::new()
                .with_style(self.style)
                .render([result])),
            OutputFormat::Json => Ok(JsonObserver::new().pretty(self.pretty).to_json(result)?),
        }
    }

    fn render_sweep(&self, title: &str, results: &[RunResult]) -> observers::Result<String> {
        match self.format {
            OutputFormat::Text => Ok(results
                .iter()
                .map(|r| {
                    format!(
                        "Testing with {} threads... Time: {:.2} ms",
                        r.workers,
                        r.elapsed_ms()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => Ok(TableObserver::new()
                .with_style(self.style)
                .with_title(title)
                .render(results)),
            OutputFormat::Json => Ok(JsonObserver::new()
                .pretty(self.pretty)
                .include_timestamp(true)
                .to_json_all(results)?),
        }
    }
}

fn finish(rendered: observers::Result<String>) -> ExitCode {
    let written = rendered.and_then(|out| {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{out}").map_err(ObserverError::from)
    });
    match written {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(&err),
    }
}

/// Prints a clap error; help and version requests are not failures.
fn usage_exit(err: clap::Error) -> ExitCode {
    let _ = err.print();
    if err.use_stderr() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn fail(err: &dyn std::error::Error) -> ExitCode {
    error!(%err, "benchmark failed");
    eprintln!("error: {err}");
    ExitCode::FAILURE
}
