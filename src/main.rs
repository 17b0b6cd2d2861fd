use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use account_recon::{
    all_passed, export_report, fetch_records, insert_accounts, insert_results, load_csv,
    open_source, setup_account_tables, setup_results_table, AcceptanceChecks, FieldValidator,
    Overrides, ReconConfig, ReconciliationEngine, ReconciliationReport, Side,
};

/// Command-line arguments for account-recon
#[derive(Parser, Debug)]
#[command(name = "account-recon")]
#[command(about = "Reconcile account records between a source and a target database")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate, reconcile and export results
    Run(RunArgs),
    /// Run, then evaluate acceptance checks; exits non-zero on any failure
    Check(RunArgs),
    /// Create the account tables in an SQLite file, optionally loading a CSV
    Seed {
        /// SQLite database file to create or extend
        database: PathBuf,
        /// CSV with account_number,account_status,note_type,updated_by,designation
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// TOML config file
    #[arg(short, long, env = "RECON_CONFIG")]
    config: Option<PathBuf>,

    /// Source SQLite database
    #[arg(long, env = "RECON_SOURCE_DB")]
    source_db: Option<PathBuf>,

    /// Target SQLite database
    #[arg(long, env = "RECON_TARGET_DB")]
    target_db: Option<PathBuf>,

    /// Directory for CSV exports
    #[arg(short, long, env = "RECON_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// SQLite file receiving the validation_results table
    #[arg(long, env = "RECON_RESULTS_DB")]
    results_db: Option<PathBuf>,

    /// Skip CSV export
    #[arg(long)]
    no_export: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Exit non-zero when any discrepancy is found
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_recon=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => {
            let (report, _) = run_reconciliation(&args)?;
            if args.strict && !report.is_reconciled() {
                eprintln!("❌ {} discrepancies found", report.summary.discrepancy_count);
                std::process::exit(1);
            }
        }
        Command::Check(args) => {
            let (report, config) = run_reconciliation(&args)?;
            if !run_checks(&report, &config) {
                std::process::exit(1);
            }
        }
        Command::Seed { database, csv } => seed(&database, csv.as_deref())?,
    }

    Ok(())
}

fn run_reconciliation(args: &RunArgs) -> Result<(ReconciliationReport, ReconConfig)> {
    let overrides = Overrides {
        source_db: args.source_db.clone(),
        target_db: args.target_db.clone(),
        output_dir: args.output_dir.clone(),
        results_db: args.results_db.clone(),
    };
    let config = ReconConfig::resolve(args.config.as_deref(), overrides)
        .context("Failed to load configuration")?;

    // 1. Fetch both sides; each connection closes before the next opens
    let source = fetch_side(&config, Side::Source)?;
    let target = fetch_side(&config, Side::Target)?;
    println!("✓ Fetched {} source rows, {} target rows", source.len(), target.len());

    // 2. Validate + reconcile
    let engine = ReconciliationEngine::with_rules(config.validation.clone());
    let report = engine
        .run(&source, &target)
        .context("Reconciliation aborted")?;
    print_summary(&report);

    // 3. Export
    if !args.no_export {
        let paths = export_report(&config.output.directory, &report)
            .context("Failed to export CSV results")?;
        println!("✓ Validation summary written to {}", paths.summary.display());
    }

    if let Some(path) = &config.output.results_database {
        let mut conn = Connection::open(path)
            .with_context(|| format!("Failed to open results database {}", path.display()))?;
        setup_results_table(&conn)?;
        let rows = insert_results(&mut conn, &report)?;
        println!("✓ Wrote {} rows to validation_results in {}", rows, path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.summary)?);
    }

    Ok((report, config))
}

fn fetch_side(config: &ReconConfig, side: Side) -> Result<Vec<account_recon::RawRecord>> {
    let path = config.database(side)?;
    info!(%side, path = %path.display(), "fetching records");

    let conn = open_source(path)
        .with_context(|| format!("Failed to open {} database {}", side, path.display()))?;
    let records = fetch_records(&conn, config.query(side))
        .with_context(|| format!("Failed to fetch {} records", side))?;

    Ok(records)
}

fn print_summary(report: &ReconciliationReport) {
    let summary = &report.summary;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Run:                      {}", summary.run_id);
    println!("Source Valid Data Count:  {} ({} rejected)", summary.source_valid_count, summary.source_rejected_count);
    println!("Target Valid Data Count:  {} ({} rejected)", summary.target_valid_count, summary.target_rejected_count);
    println!("Discrepancies Count:      {}", summary.discrepancy_count);
    println!("  source only:            {}", summary.source_only_count);
    println!("  target only:            {}", summary.target_only_count);
    println!("  field mismatches:       {}", summary.mismatched_count);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for side in &summary.empty_sides {
        println!("⚠️  No valid {} records - check the query and source data", side);
    }
    for entry in report.discrepancies.iter().take(20) {
        println!("  {}", entry.describe());
    }
    if report.discrepancies.len() > 20 {
        println!("  ... {} more", report.discrepancies.len() - 20);
    }
}

fn run_checks(report: &ReconciliationReport, config: &ReconConfig) -> bool {
    let checks = AcceptanceChecks::new(FieldValidator::with_rules(config.validation.clone()));
    let outcomes = checks.run(report);

    println!("\n🔍 Acceptance checks");
    for outcome in &outcomes {
        let mark = if outcome.passed { "✅" } else { "❌" };
        println!("{} {}: {}", mark, outcome.kind.name(), outcome.message);
    }

    let passed = all_passed(&outcomes);
    if passed {
        println!("\n🎉 Source and target reconcile");
    }
    passed
}

fn seed(database: &Path, csv: Option<&Path>) -> Result<()> {
    let mut conn = Connection::open(database)
        .with_context(|| format!("Failed to open {}", database.display()))?;
    setup_account_tables(&conn)?;
    println!("✓ Account tables ready in {}", database.display());

    if let Some(csv_path) = csv {
        let records = load_csv(csv_path)
            .with_context(|| format!("Failed to load {}", csv_path.display()))?;
        let inserted = insert_accounts(&mut conn, &records)?;
        println!("✓ Inserted {} accounts", inserted);
    }

    Ok(())
}
