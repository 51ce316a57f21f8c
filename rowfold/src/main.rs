//! # rowfold
//!
//! A CLI tool that folds the flat rows of a join query into one record per
//! key and prints them as a table.
//!
//! ## Overview
//!
//! rowfold is built on top of rowfoldlib. It reads a results payload
//! (`{"columns": [...], "results": [...]}`), optionally folds rows sharing a
//! key column, and renders the outcome as a text table, as table JSON, or as
//! the merged records themselves.
//!
//! ## Usage
//!
//! ```bash
//! # Show a payload as a table
//! rowfold results.json
//!
//! # One row per id, with publications kept together
//! rowfold results.json --key id --composite "publication=title:pubtitle,year:pubyear"
//!
//! # Pick and relabel columns, then sort by Name (click twice for descending)
//! rowfold results.json -k id --column Name=last_name --column interest -s Name -s Name
//!
//! # Merged records as JSON, read from stdin
//! cat results.json | rowfold -k id -o records
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

mod render;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use render::OutputMode;
use rowfoldlib::{
    serialize, ColumnSpec, CompositeField, JoinMode, JoinOptions, MergedResultSet, ResultSet,
    ResultTable,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Text table
    Table,
    /// Table headers, rows and sort state as JSON
    Json,
    /// Table cells as CSV
    Csv,
    /// Merged records as JSON
    Records,
}

#[derive(Debug, Parser)]
#[command(
    name = "rowfold",
    version,
    author = "Arthur Debert",
    about = "Fold joined query results into one row per key and print them as sortable tables"
)]
struct Cli {
    /// Results payload to read (`-` for stdin)
    #[arg(default_value = "-")]
    input: String,

    /// Fold rows sharing this column's value into one record
    #[arg(short, long)]
    key: Option<String>,

    /// Composite field, e.g. `publication=title:pubtitle,year:pubyear` (repeatable)
    #[arg(short = 'c', long = "composite", value_name = "SPEC")]
    composites: Vec<CompositeField>,

    /// JSON file with composite field declarations
    #[arg(long, value_name = "PATH")]
    composites_file: Option<PathBuf>,

    /// Legacy folding: drop the key column and keep repeated values
    #[arg(long, requires = "key")]
    legacy: bool,

    /// Fail when the key column is not one of the result columns
    #[arg(long, requires = "key")]
    strict: bool,

    /// Column to show, as `field` or `Label=field` (repeatable, in order)
    #[arg(long = "column", value_name = "COLUMN")]
    columns: Vec<ColumnSpec>,

    /// Click this column header to sort; repeat to reverse (repeatable)
    #[arg(short, long = "sort", value_name = "HEADER")]
    sort: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

/// Read the results payload from a file or stdin
fn load_result_set(input: &str) -> anyhow::Result<ResultSet> {
    if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read results from stdin")?;
        return Ok(ResultSet::from_json_str(&buffer)?);
    }
    Ok(ResultSet::from_path(input)?)
}

/// Collect composite declarations from flags and the optional file
fn collect_composites(cli: &Cli) -> anyhow::Result<Vec<CompositeField>> {
    let mut composites = cli.composites.clone();
    if let Some(path) = &cli.composites_file {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        composites.extend(CompositeField::list_from_json(&json)?);
    }
    Ok(composites)
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let result_set = load_result_set(&cli.input)?;
    let composites = collect_composites(cli)?;

    let merged = match &cli.key {
        Some(key) => {
            let mode = if cli.legacy {
                JoinMode::Legacy
            } else {
                JoinMode::Rich
            };
            let options = JoinOptions::new(key.as_str())
                .composites(composites)
                .mode(mode)
                .strict(cli.strict);
            serialize(&result_set, &options)?
        }
        None => {
            if !composites.is_empty() {
                bail!("composite fields need a key column (--key)");
            }
            MergedResultSet::from(&result_set)
        }
    };

    if cli.output == OutputFormat::Records {
        if !cli.sort.is_empty() {
            tracing::warn!("--sort has no effect on record output");
        }
        return Ok(format!("{}\n", serde_json::to_string_pretty(&merged)?));
    }

    let mut table = ResultTable::from_merged(&merged, &cli.columns);
    for header in &cli.sort {
        table.click_header(header)?;
    }

    match cli.output {
        OutputFormat::Json => render::render_table(&table, OutputMode::Json),
        OutputFormat::Csv => Ok(render::render_csv(&table)),
        OutputFormat::Table | OutputFormat::Records => {
            render::render_table(&table, OutputMode::Auto)
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed arguments");

    match run(&cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
