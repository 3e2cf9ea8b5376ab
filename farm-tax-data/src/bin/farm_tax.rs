use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use farm_tax_core::TaxTables;
use farm_tax_data::{Scenario, TableLoader, TableSources};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Farm tax calculator.
///
/// Loads rate tables, runs the scenario in the given TOML file, and prints
/// the federal, state, and combined figures as JSON.
#[derive(Debug, Parser)]
#[command(name = "farm-tax")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the scenario TOML file.
    scenario: PathBuf,

    /// Directory holding federal_brackets.csv, state_brackets.csv,
    /// standard_deductions.csv, macrs_half_year.csv, bonus_rates.csv and
    /// parameters.toml. The built-in 2024 tables are used when omitted.
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Print compact JSON on one line.
    #[arg(long, default_value_t = false)]
    compact: bool,
}

/// Initialise the tracing subscriber.
///
/// * Honours `RUST_LOG` when set, falling back to `info`.
/// * Writes to stderr so stdout carries only the JSON report.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

/// Reads a whole file, naming the path on failure.
fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read: {}", path.display()))
}

/// Loads every rate table from the files in `dir`.
fn load_tables(dir: &Path) -> Result<TaxTables> {
    let federal_brackets = read(&dir.join("federal_brackets.csv"))?;
    let state_brackets = read(&dir.join("state_brackets.csv"))?;
    let standard_deductions = read(&dir.join("standard_deductions.csv"))?;
    let macrs_half_year = read(&dir.join("macrs_half_year.csv"))?;
    let bonus_rates = read(&dir.join("bonus_rates.csv"))?;
    let parameters = read(&dir.join("parameters.toml"))?;

    TableLoader::load_all(&TableSources {
        federal_brackets: &federal_brackets,
        state_brackets: &state_brackets,
        standard_deductions: &standard_deductions,
        macrs_half_year: &macrs_half_year,
        bonus_rates: &bonus_rates,
        parameters: &parameters,
    })
    .with_context(|| format!("Failed to load tables from: {}", dir.display()))
}

/// Runs one scenario and writes its report to stdout.
fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let tables = match &cli.data {
        Some(dir) => {
            info!("Loading tables from: {}", dir.display());
            load_tables(dir)?
        }
        None => {
            debug!("Using built-in 2024 tables");
            TaxTables::tax_year_2024()
        }
    };

    let scenario = Scenario::from_toml(&read(&cli.scenario)?)
        .with_context(|| format!("Failed to parse scenario: {}", cli.scenario.display()))?;
    let report = scenario
        .run(&tables)
        .with_context(|| format!("Failed to run scenario: {}", cli.scenario.display()))?;

    let json = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{json}");

    Ok(())
}
