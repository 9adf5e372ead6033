// tabeval - score predicted query results against gold tables

mod eval;
mod exit_codes;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use exit_codes::EXIT_SUCCESS;

#[derive(Parser)]
#[command(name = "tabeval")]
#[command(about = "Score tabular query results against gold answers")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every instance listed in a TOML benchmark config
    #[command(after_help = "\
Examples:
  tabeval run bench.toml
  tabeval run bench.toml --json
  tabeval run bench.toml --output report.json --threads 4")]
    Run {
        /// Path to the benchmark config file
        config: PathBuf,

        /// Print the JSON report to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON report to this file (overrides [output] json)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Worker threads (overrides `threads` in the config)
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Score one predicted result against one or more gold results
    #[command(after_help = "\
Examples:
  tabeval compare pred.csv gold.csv
  tabeval compare pred.csv gold_a.csv gold_b.csv --json
  tabeval compare pred.csv gold.csv --tolerance 0.001 --case-sensitive

Exit code 1 when the prediction is not correct, like diff(1).")]
    Compare {
        /// Predicted result file (CSV/TSV with header row)
        predicted: PathBuf,

        /// Gold result file(s); the best-scoring one is reported
        #[arg(required = true, num_args = 1..)]
        gold: Vec<PathBuf>,

        /// Float comparison tolerance
        #[arg(long, default_value_t = tabeval_score::values::DEFAULT_TOLERANCE)]
        tolerance: f64,

        /// Compare text values case-sensitively
        #[arg(long)]
        case_sensitive: bool,

        /// Print the result as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Parse and validate a benchmark config without scoring
    Validate {
        /// Path to the benchmark config file
        config: PathBuf,
    },

    /// Print the normalized form of column names
    #[command(after_help = "\
Examples:
  tabeval normalize Customer_ID avg_qty
  tabeval normalize 'Total Amt' --config bench.toml --json")]
    Normalize {
        /// Raw column names
        #[arg(required = true)]
        names: Vec<String>,

        /// Use the vocabulary from this config instead of the built-in one
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print JSON instead of tab-separated lines
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  tabeval-score ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  tabeval-score ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

/// A command failure: exit code, message for stderr, optional hint.
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Run { config, json, output, threads } => {
            eval::cmd_run(config, json, output, threads)
        }
        Commands::Compare { predicted, gold, tolerance, case_sensitive, json } => {
            eval::cmd_compare(predicted, gold, tolerance, case_sensitive, json)
        }
        Commands::Validate { config } => eval::cmd_validate(config),
        Commands::Normalize { names, config, json } => eval::cmd_normalize(names, config, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
