// 🔍 Acceptance Checks - pass/fail verdicts over a finished run
//
// Used by `account-recon check` to gate a migration:
//   1. every valid source row satisfies each column rule (one check per column)
//   2. valid source and target row counts are equal
//   3. the discrepancy set is empty
//
// Check 2 is reported on its own: equal counts say nothing about keys.

use crate::record::{Field, Side};
use crate::report::ReconciliationReport;
use crate::validator::FieldValidator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    ColumnValues(Field),
    RowCount,
    NoDiscrepancies,
}

impl CheckKind {
    pub fn name(&self) -> String {
        match self {
            CheckKind::ColumnValues(field) => format!("column_values[{}]", field),
            CheckKind::RowCount => "row_count".to_string(),
            CheckKind::NoDiscrepancies => "no_discrepancies".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub kind: CheckKind,
    pub passed: bool,
    pub message: String,
}

impl CheckOutcome {
    fn pass(kind: CheckKind, message: String) -> Self {
        CheckOutcome {
            kind,
            passed: true,
            message,
        }
    }

    fn fail(kind: CheckKind, message: String) -> Self {
        CheckOutcome {
            kind,
            passed: false,
            message,
        }
    }
}

pub fn all_passed(outcomes: &[CheckOutcome]) -> bool {
    outcomes.iter().all(|o| o.passed)
}

pub struct AcceptanceChecks {
    validator: FieldValidator,
}

impl AcceptanceChecks {
    pub fn new(validator: FieldValidator) -> Self {
        AcceptanceChecks { validator }
    }

    pub fn run(&self, report: &ReconciliationReport) -> Vec<CheckOutcome> {
        let mut outcomes = self.column_values(report, Side::Source);
        outcomes.push(row_count(report));
        outcomes.push(no_discrepancies(report));
        outcomes
    }

    /// One outcome per field, counting rows of `side` that break its rule
    pub fn column_values(&self, report: &ReconciliationReport, side: Side) -> Vec<CheckOutcome> {
        let reports: Vec<_> = report
            .valid(side)
            .iter()
            .map(|r| self.validator.validate_record(r))
            .collect();

        Field::ALL
            .into_iter()
            .map(|field| {
                let kind = CheckKind::ColumnValues(field);
                let violations = reports
                    .iter()
                    .filter(|r| r.checks.iter().any(|c| c.field == field && !c.passed))
                    .count();

                if violations == 0 {
                    CheckOutcome::pass(
                        kind,
                        format!("{} {} rows satisfy the {} rule", reports.len(), side, field),
                    )
                } else {
                    CheckOutcome::fail(
                        kind,
                        format!("{} {} rows violate the {} rule", violations, side, field),
                    )
                }
            })
            .collect()
    }
}

impl Default for AcceptanceChecks {
    fn default() -> Self {
        Self::new(FieldValidator::new())
    }
}

fn row_count(report: &ReconciliationReport) -> CheckOutcome {
    let summary = &report.summary;
    let message = format!(
        "source {} rows, target {} rows",
        summary.source_valid_count, summary.target_valid_count
    );

    if summary.row_counts_match() {
        CheckOutcome::pass(CheckKind::RowCount, message)
    } else {
        CheckOutcome::fail(CheckKind::RowCount, format!("Row count mismatch: {}", message))
    }
}

fn no_discrepancies(report: &ReconciliationReport) -> CheckOutcome {
    if report.discrepancies.is_empty() {
        CheckOutcome::pass(CheckKind::NoDiscrepancies, "no discrepancies".to_string())
    } else {
        let preview: Vec<String> = report
            .discrepancies
            .iter()
            .take(5)
            .map(|d| d.describe())
            .collect();
        CheckOutcome::fail(
            CheckKind::NoDiscrepancies,
            format!(
                "{} discrepancies found: {}",
                report.discrepancies.len(),
                preview.join("; ")
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ReconciliationEngine;
    use crate::record::{AccountRecord, RawRecord};

    fn create_test_raw(account_number: &str, note_type: &str) -> RawRecord {
        RawRecord::from(&AccountRecord::new(
            account_number,
            "Active",
            note_type,
            "alice",
            "Teller",
        ))
    }

    fn run(source: &[RawRecord], target: &[RawRecord]) -> Vec<CheckOutcome> {
        let report = ReconciliationEngine::new().run(source, target).unwrap();
        AcceptanceChecks::default().run(&report)
    }

    fn outcome(outcomes: &[CheckOutcome], kind: CheckKind) -> &CheckOutcome {
        outcomes.iter().find(|o| o.kind == kind).unwrap()
    }

    #[test]
    fn test_clean_run_passes_everything() {
        let rows = vec![create_test_raw("100001", "Deposit"), create_test_raw("100002", "Fee")];

        let outcomes = run(&rows, &rows);

        assert_eq!(outcomes.len(), 7);
        assert!(all_passed(&outcomes));
    }

    #[test]
    fn test_equal_counts_do_not_hide_key_differences() {
        let source = vec![create_test_raw("100001", "Deposit")];
        let target = vec![create_test_raw("200001", "Deposit")];

        let outcomes = run(&source, &target);

        assert!(outcome(&outcomes, CheckKind::RowCount).passed);
        assert!(!outcome(&outcomes, CheckKind::NoDiscrepancies).passed);
        assert!(!all_passed(&outcomes));
    }

    #[test]
    fn test_row_count_mismatch_fails() {
        let source = vec![create_test_raw("100001", "Deposit"), create_test_raw("100002", "Fee")];
        let target = vec![create_test_raw("100001", "Deposit")];

        let outcomes = run(&source, &target);
        let row_count = outcome(&outcomes, CheckKind::RowCount);

        assert!(!row_count.passed);
        assert_eq!(row_count.message, "Row count mismatch: source 2 rows, target 1 rows");
    }

    #[test]
    fn test_column_rules_hold_for_valid_source() {
        let source = vec![create_test_raw("100001", "Deposit"), create_test_raw("1001", "Fee")];

        let outcomes = run(&source, &[]);

        for field in Field::ALL {
            assert!(outcome(&outcomes, CheckKind::ColumnValues(field)).passed, "{}", field);
        }
    }

    #[test]
    fn test_column_check_against_stricter_rules_fails() {
        let report = ReconciliationEngine::new()
            .run(&[create_test_raw("100001", "Deposit")], &[])
            .unwrap();
        let stricter = FieldValidator::with_rules(crate::validator::ValidationRules {
            account_number_length: 10,
            ..Default::default()
        });

        let outcomes = AcceptanceChecks::new(stricter).column_values(&report, Side::Source);

        assert!(!outcomes[0].passed);
        assert_eq!(outcomes[0].message, "1 source rows violate the account_number rule");
        assert!(outcomes[1..].iter().all(|o| o.passed));
    }

    #[test]
    fn test_check_names() {
        assert_eq!(
            CheckKind::ColumnValues(Field::NoteType).name(),
            "column_values[note_type]"
        );
        assert_eq!(CheckKind::RowCount.name(), "row_count");
    }
}
