// 📤 CSV Export - write a reconciliation report to a directory
//
// Files (headers are always written, even for empty sets):
//   source_valid.csv         valid source rows
//   target_valid.csv         valid target rows
//   discrepancies.csv        one row per discrepancy, both sides side by side
//   rejected.csv             rows dropped by the validity filter
//   validation_summary.csv   Metric,Count

use crate::error::Result;
use crate::reconciler::DiscrepancyEntry;
use crate::record::{AccountRecord, Field, Side};
use crate::report::ReconciliationReport;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportPaths {
    pub source_valid: PathBuf,
    pub target_valid: PathBuf,
    pub discrepancies: PathBuf,
    pub rejected: PathBuf,
    pub summary: PathBuf,
}

impl ExportPaths {
    pub fn in_dir(dir: &Path) -> Self {
        ExportPaths {
            source_valid: dir.join("source_valid.csv"),
            target_valid: dir.join("target_valid.csv"),
            discrepancies: dir.join("discrepancies.csv"),
            rejected: dir.join("rejected.csv"),
            summary: dir.join("validation_summary.csv"),
        }
    }
}

#[derive(Serialize)]
struct DiscrepancyRow<'a> {
    account_number: &'a str,
    membership: &'static str,
    account_status_source: Option<&'a str>,
    note_type_source: Option<&'a str>,
    updated_by_source: Option<&'a str>,
    designation_source: Option<&'a str>,
    account_status_target: Option<&'a str>,
    note_type_target: Option<&'a str>,
    updated_by_target: Option<&'a str>,
    designation_target: Option<&'a str>,
    mismatched_fields: String,
}

const DISCREPANCY_HEADERS: [&str; 11] = [
    "account_number",
    "membership",
    "account_status_source",
    "note_type_source",
    "updated_by_source",
    "designation_source",
    "account_status_target",
    "note_type_target",
    "updated_by_target",
    "designation_target",
    "mismatched_fields",
];

impl<'a> DiscrepancyRow<'a> {
    fn from_entry(entry: &'a DiscrepancyEntry) -> Self {
        let source = |field: Field| entry.source.as_ref().map(|r| r.value(field));
        let target = |field: Field| entry.target.as_ref().map(|r| r.value(field));
        let mismatched: Vec<&str> = entry.mismatched_fields().iter().map(|f| f.name()).collect();

        DiscrepancyRow {
            account_number: &entry.account_number,
            membership: entry.membership.name(),
            account_status_source: source(Field::AccountStatus),
            note_type_source: source(Field::NoteType),
            updated_by_source: source(Field::UpdatedBy),
            designation_source: source(Field::Designation),
            account_status_target: target(Field::AccountStatus),
            note_type_target: target(Field::NoteType),
            updated_by_target: target(Field::UpdatedBy),
            designation_target: target(Field::Designation),
            mismatched_fields: mismatched.join("|"),
        }
    }
}

fn writer(path: &Path, headers: &[&str]) -> Result<csv::Writer<fs::File>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    wtr.write_record(headers)?;
    Ok(wtr)
}

pub fn write_records(path: &Path, records: &[AccountRecord]) -> Result<()> {
    let headers = Field::ALL.map(|f| f.name());
    let mut wtr = writer(path, &headers)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_discrepancies(path: &Path, entries: &[DiscrepancyEntry]) -> Result<()> {
    let mut wtr = writer(path, &DISCREPANCY_HEADERS)?;
    for entry in entries {
        wtr.serialize(DiscrepancyRow::from_entry(entry))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_rejected(path: &Path, report: &ReconciliationReport) -> Result<()> {
    let mut wtr = writer(path, &["side", "row", "account_number", "failures"])?;
    for side in [Side::Source, Side::Target] {
        for rejected in report.rejected(side) {
            let failures: Vec<String> = rejected
                .failures
                .iter()
                .map(|c| format!("{}: {}", c.field, c.reason))
                .collect();
            let row = rejected.row.to_string();
            let failures = failures.join("; ");
            wtr.write_record([
                side.name(),
                row.as_str(),
                rejected.record.account_number.as_str(),
                failures.as_str(),
            ])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_summary(path: &Path, report: &ReconciliationReport) -> Result<()> {
    let mut wtr = writer(path, &["Metric", "Count"])?;
    for (metric, count) in report.summary.metrics() {
        let count = count.to_string();
        wtr.write_record([metric, count.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write every export file into `dir`, creating it if needed
pub fn export_report(dir: &Path, report: &ReconciliationReport) -> Result<ExportPaths> {
    fs::create_dir_all(dir)?;
    let paths = ExportPaths::in_dir(dir);

    write_records(&paths.source_valid, &report.source_valid)?;
    write_records(&paths.target_valid, &report.target_valid)?;
    write_discrepancies(&paths.discrepancies, &report.discrepancies)?;
    write_rejected(&paths.rejected, report)?;
    write_summary(&paths.summary, report)?;

    info!(dir = %dir.display(), "exported reconciliation report");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ReconciliationEngine;
    use crate::record::RawRecord;

    fn create_test_raw(account_number: &str, note_type: &str) -> RawRecord {
        RawRecord::from(&AccountRecord::new(
            account_number,
            "Active",
            note_type,
            "alice",
            "Teller",
        ))
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();
        rdr.records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect()
    }

    #[test]
    fn test_export_writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let report = ReconciliationEngine::new()
            .run(
                &[create_test_raw("100001", "Deposit"), create_test_raw("100", "Fee")],
                &[create_test_raw("100001", "Withdrawal"), create_test_raw("100002", "Fee")],
            )
            .unwrap();

        let paths = export_report(dir.path(), &report).unwrap();

        let source = read_rows(&paths.source_valid);
        assert_eq!(source[0], Field::ALL.map(|f| f.name().to_string()).to_vec());
        assert_eq!(source.len(), 2);

        let discrepancies = read_rows(&paths.discrepancies);
        assert_eq!(discrepancies.len(), 3);
        assert_eq!(discrepancies[1][0], "100001");
        assert_eq!(discrepancies[1][1], "both");
        assert_eq!(discrepancies[1][3], "Deposit");
        assert_eq!(discrepancies[1][7], "Withdrawal");
        assert_eq!(discrepancies[1][10], "note_type");
        assert_eq!(discrepancies[2][1], "target_only");
        assert_eq!(discrepancies[2][2], "");

        let rejected = read_rows(&paths.rejected);
        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[1][0], "source");
        assert_eq!(rejected[1][2], "100");

        let summary = read_rows(&paths.summary);
        assert_eq!(
            summary,
            vec![
                vec!["Metric".to_string(), "Count".to_string()],
                vec!["Source Valid Data Count".to_string(), "1".to_string()],
                vec!["Target Valid Data Count".to_string(), "2".to_string()],
                vec!["Discrepancies Count".to_string(), "2".to_string()],
            ]
        );
    }

    #[test]
    fn test_empty_sets_still_get_headers() {
        let dir = tempfile::tempdir().unwrap();
        let report = ReconciliationEngine::new().run(&[], &[]).unwrap();

        let paths = export_report(&dir.path().join("nested"), &report).unwrap();

        assert_eq!(read_rows(&paths.target_valid).len(), 1);
        assert_eq!(read_rows(&paths.discrepancies)[0].len(), DISCREPANCY_HEADERS.len());
    }
}
