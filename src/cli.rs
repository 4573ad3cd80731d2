use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, DEFAULT_LOG_FILTER};
use crate::interpreter::{RunReport, RunStatus, Scheduler, TraceFormat};
use crate::parser;

#[derive(Parser)]
#[command(name = "strand")]
#[command(about = "Strand - cooperative fork/join interpreter", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a program and emit its execution trace
    Run {
        /// Program source file
        file: PathBuf,

        /// Stop after this many instructions in total
        #[arg(short = 'b', long = "budget")]
        budget: Option<usize>,

        /// Execute without recording a trace
        #[arg(long)]
        dry_run: bool,

        /// Write the trace here instead of stdout
        #[arg(short = 'o', long = "trace-out")]
        trace_out: Option<PathBuf>,

        /// Trace output format
        #[arg(short = 'f', long = "format", value_enum)]
        format: Option<TraceFormat>,

        /// Separator for stack snapshots in the trace
        #[arg(short = 'd', long = "delimiter")]
        delimiter: Option<String>,
    },

    /// Print the token stream of a program with positions
    Tokens {
        /// Program source file
        file: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

/// Run the CLI by parsing process arguments
///
/// Also installs the global tracing subscriber, so call it once per process.
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.config.clone());
    run_cli_with_args(cli).await
}

/// Run the CLI with provided arguments
pub async fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli).await
}

async fn run_cli_with_args(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            file,
            budget,
            dry_run,
            trace_out,
            format,
            delimiter,
        } => {
            let config = Config::builder()
                .config_path(cli.config)
                .step_budget(budget)
                .dry_run(dry_run.then_some(true))
                .delimiter(delimiter)
                .format(format)
                .build()
                .context("Failed to load configuration")?;

            let source = read_source(&file).await?;
            let program = parser::tokenize(&source)
                .with_context(|| format!("Failed to tokenize {}", file.display()))?;

            let mut scheduler = Scheduler::with_delimiter(&program, &config.trace.delimiter);
            let report = scheduler.run(&config.run_options());

            if !config.scheduler.dry_run {
                let mut rendered = Vec::new();
                scheduler
                    .trace()
                    .write_to(&mut rendered, config.trace.format)
                    .context("Failed to render trace")?;

                match trace_out {
                    Some(path) => tokio::fs::write(&path, rendered)
                        .await
                        .with_context(|| format!("Failed to write trace to {}", path.display()))?,
                    None => print!("{}", String::from_utf8_lossy(&rendered)),
                }
            }

            print_summary(&scheduler, &report);
        }

        Commands::Tokens { file } => {
            let source = read_source(&file).await?;
            let program = parser::tokenize(&source)
                .with_context(|| format!("Failed to tokenize {}", file.display()))?;

            for (token, pos) in program.tokens.iter().zip(&program.positions) {
                println!("{}\t{}:{}\t{}", pos.index, pos.line + 1, pos.col + 1, token);
            }
        }

        Commands::Config => {
            let config = Config::builder()
                .config_path(cli.config)
                .build()
                .context("Failed to load configuration")?;
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

/// `log.filter` from the configuration the command will run with
pub fn configured_log_filter(config_path: Option<PathBuf>) -> String {
    Config::builder()
        .config_path(config_path)
        .build()
        .map(|config| config.log.filter)
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string())
}

/// Log to stderr; `RUST_LOG` wins over the configured filter
fn init_logging(config_path: Option<PathBuf>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(configured_log_filter(config_path)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn read_source(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Run summary on stderr, so stdout carries only the trace
fn print_summary(scheduler: &Scheduler, report: &RunReport) {
    let status = match report.status {
        RunStatus::Completed => "completed",
        RunStatus::BudgetExhausted => "step budget exhausted",
        RunStatus::Deadlocked => "deadlocked",
    };
    eprintln!(
        "{} after {} steps in {} rounds",
        status, report.steps, report.rounds
    );

    for (id, outcome) in scheduler.outcomes() {
        let stack: Vec<String> = outcome.stack.iter().map(|v| v.to_string()).collect();
        match &outcome.fault {
            Some(error) => eprintln!("  thread {}: failed: {}", id, error),
            None => eprintln!("  thread {}: [{}]", id, stack.join(" ")),
        }
    }

    if !scheduler.is_idle() {
        eprintln!("  still live: {:?}", scheduler.live_ids());
    }
    if report.dangling_joins > 0 {
        eprintln!("  dangling joins: {}", report.dangling_joins);
    }
}
