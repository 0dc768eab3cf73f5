//! `omega-summary` entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration** — read `--input` and `--log-format` from the
//!    command line ([`config::CliConfig`]).
//! 2. **Wire observability** — install a `tracing-subscriber` text or JSON
//!    layer on stderr, filtered by `RUST_LOG`.
//! 3. **Ingest** — read the shard file and parse it into a JSON value.
//! 4. **Summarise** — hand the records to [`omega::AggregationLayer`] and
//!    print the rendered summary on stdout.
//!
//! Exit status: `0` on success, `1` when ingestion or summarisation fails,
//! `2` for usage errors.

mod config;
mod observability;

use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result};
use omega::{render_summary_json, AggregationLayer};
use serde_json::Value;

use config::{CliConfig, Command};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = match CliConfig::from_args(&args) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("error: {e}");
            print_usage();
            return ExitCode::from(2);
        }
    };

    observability::init(config.log_format);

    match run(&config) {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(input = %config.input.display(), error = %e, "Summary failed");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// Reads the shard file named by `config` and returns the rendered summary.
fn run(config: &CliConfig) -> Result<String> {
    let contents = fs::read_to_string(&config.input)
        .with_context(|| format!("Failed to read shard file: {:?}", config.input))?;

    let records: Value =
        serde_json::from_str(&contents).context("Failed to parse shard file as JSON")?;

    let layer = AggregationLayer::from_records(&records).context("Failed to load shard records")?;
    tracing::info!(shard_count = layer.len(), "Loaded shards");

    let summary = layer.summarize().context("Failed to summarise shards")?;
    render_summary_json(&summary).context("Failed to render summary")
}

fn print_usage() {
    eprintln!(
        r#"omega-summary - summarise Ω scores across shards

USAGE:
    omega-summary --input <FILE> [--log-format text|json]

OPTIONS:
    -i, --input <FILE>      JSON file containing a list of shard records
        --log-format <FMT>  Log output on stderr: 'text' (default) or 'json'
    -h, --help              Print this message

ENVIRONMENT:
    RUST_LOG                Log filter (default: warn)

INPUT:
    [{{"name": "a", "psi": 0.9, "theta": 0.88, "cvar": 0.07, "pole": 0.8, "cog": 0.79}}, ...]
    'pole' and 'cog' are optional and default to 0.
"#
    );
}
