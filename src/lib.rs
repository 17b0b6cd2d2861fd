// Account Reconciliation - Core Library
// Validates account rows from a source and a target database, joins them by
// account number and reports every difference.

pub mod error;
pub mod record;      // Record model: fields, raw rows, normalized rows
pub mod validator;   // Field Validator
pub mod filter;      // Validity Filter
pub mod reconciler;  // Outer join + field comparison
pub mod report;      // Report Assembler
pub mod engine;      // End-to-end pipeline
pub mod checks;      // Acceptance checks over a finished run
pub mod db;          // SQLite fetch collaborator + results table
pub mod export;      // CSV export collaborator
pub mod config;

// Re-export commonly used types
pub use error::{ReconError, Result};
pub use record::{AccountRecord, Field, RawRecord, RawValue, Side};
pub use validator::{FieldCheck, FieldReport, FieldValidator, NullHandling, ValidationRules};
pub use filter::{FilterOutcome, RejectedRecord, ValidityFilter};
pub use reconciler::{Classification, DiscrepancyEntry, FieldMatches, Membership, Reconciler};
pub use report::{ReconciliationReport, ReportAssembler, Summary};
pub use engine::ReconciliationEngine;
pub use checks::{all_passed, AcceptanceChecks, CheckKind, CheckOutcome};
pub use db::{
    fetch_records, insert_accounts, insert_results, load_csv, open_source,
    setup_account_tables, setup_results_table, ACCOUNTS_QUERY,
};
pub use export::{export_report, ExportPaths};
pub use config::{Overrides, ReconConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
