// 🔁 Reconciliation Engine - raw rows in, report out
//
//   source rows ─► ValidityFilter ─┐
//                                  ├─► Reconciler ─► ReportAssembler
//   target rows ─► ValidityFilter ─┘
//
// One synchronous pass over two fully materialized record sets.

use crate::error::Result;
use crate::filter::ValidityFilter;
use crate::reconciler::Reconciler;
use crate::record::{RawRecord, Side};
use crate::report::{ReconciliationReport, ReportAssembler};
use crate::validator::{FieldValidator, ValidationRules};
use tracing::info;

pub struct ReconciliationEngine {
    filter: ValidityFilter,
    reconciler: Reconciler,
    assembler: ReportAssembler,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self::with_rules(ValidationRules::default())
    }

    pub fn with_rules(rules: ValidationRules) -> Self {
        ReconciliationEngine {
            filter: ValidityFilter::new(FieldValidator::with_rules(rules)),
            reconciler: Reconciler::new(),
            assembler: ReportAssembler::new(),
        }
    }

    pub fn rules(&self) -> &ValidationRules {
        self.filter.validator().rules()
    }

    /// Validate both sides, join them by account number and assemble the
    /// report. Structural problems (missing columns, duplicate keys) abort
    /// the run; failing field checks only drop rows.
    pub fn run(&self, source: &[RawRecord], target: &[RawRecord]) -> Result<ReconciliationReport> {
        info!(source = source.len(), target = target.len(), "starting reconciliation");

        let source_outcome = self.filter.partition(Side::Source, source)?;
        let target_outcome = self.filter.partition(Side::Target, target)?;

        let classification = self
            .reconciler
            .reconcile(&source_outcome.valid, &target_outcome.valid)?;

        let report = self
            .assembler
            .assemble(source_outcome, target_outcome, classification);

        info!("{}", report.summary.describe());

        Ok(report)
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconError;
    use crate::reconciler::Membership;
    use crate::record::{Field, RawValue};
    use crate::validator::NullHandling;

    fn create_test_raw(
        account_number: &str,
        status: &str,
        note_type: &str,
        updated_by: &str,
        designation: &str,
    ) -> RawRecord {
        RawRecord::new()
            .with(Field::AccountNumber, account_number)
            .with(Field::AccountStatus, status)
            .with(Field::NoteType, note_type)
            .with(Field::UpdatedBy, updated_by)
            .with(Field::Designation, designation)
    }

    #[test]
    fn test_identical_records_reconcile() {
        let engine = ReconciliationEngine::new();
        let source = vec![create_test_raw("100001", "Active", "Deposit", "alice", "Teller")];
        let target = vec![create_test_raw("100001", "Active", "Deposit", "alice", "Teller")];

        let report = engine.run(&source, &target).unwrap();

        assert!(report.discrepancies.is_empty());
        assert_eq!(report.source_valid.len(), 1);
        assert_eq!(report.target_valid.len(), 1);
        assert!(report.is_reconciled());
    }

    #[test]
    fn test_note_type_difference_is_reported() {
        let engine = ReconciliationEngine::new();
        let source = vec![create_test_raw("100001", "Active", "Deposit", "alice", "Teller")];
        let target = vec![create_test_raw("100001", "Active", "Withdrawal", "alice", "Teller")];

        let report = engine.run(&source, &target).unwrap();

        assert_eq!(report.discrepancies.len(), 1);
        let entry = &report.discrepancies[0];
        assert_eq!(entry.account_number, "100001");
        assert_eq!(entry.mismatched_fields(), vec![Field::NoteType]);
        let matches = entry.matches.unwrap();
        assert!(matches.account_status && matches.updated_by && matches.designation);
        assert!(!matches.note_type);
    }

    #[test]
    fn test_short_account_number_never_reaches_reconciler() {
        let engine = ReconciliationEngine::new();
        let source = vec![create_test_raw("10001", "Active", "Deposit", "alice", "Teller")];
        let target = vec![create_test_raw("10001", "Active", "Deposit", "alice", "Teller")];

        let report = engine.run(&source, &target).unwrap();

        assert!(report.source_valid.is_empty());
        assert!(report.discrepancies.is_empty());
        assert_eq!(report.source_rejected.len(), 1);
        assert_eq!(report.source_rejected[0].failures[0].field, Field::AccountNumber);
    }

    #[test]
    fn test_empty_target_gives_one_source_only_entry() {
        let engine = ReconciliationEngine::new();
        let source = vec![create_test_raw("100001", "Active", "Deposit", "alice", "Teller")];

        let report = engine.run(&source, &[]).unwrap();

        assert_eq!(report.target_valid.len(), 0);
        assert_eq!(report.discrepancies.len(), 1);
        assert_eq!(report.discrepancies[0].membership, Membership::SourceOnly);
        assert_eq!(report.summary.empty_sides, vec![Side::Target]);
    }

    #[test]
    fn test_target_rows_validated_against_their_own_values() {
        let engine = ReconciliationEngine::new();
        let source = vec![
            create_test_raw("100001", "Active", "Deposit", "alice", "Teller"),
            create_test_raw("100002", "Active", "Deposit", "bob", "Teller"),
        ];
        let target = vec![
            create_test_raw("100001", "Closed", "Deposit", "alice", "Teller"),
            create_test_raw("100002", "Active", "Deposit", "bob", "Teller"),
        ];

        let report = engine.run(&source, &target).unwrap();

        // 100001 is invalid in target only, so it shows up as source-only
        assert_eq!(report.target_valid.len(), 1);
        assert_eq!(report.discrepancies.len(), 1);
        assert_eq!(report.discrepancies[0].account_number, "100001");
        assert_eq!(report.discrepancies[0].membership, Membership::SourceOnly);
    }

    #[test]
    fn test_duplicate_valid_key_aborts_run() {
        let engine = ReconciliationEngine::new();
        let source = vec![
            create_test_raw("100001", "Active", "Deposit", "alice", "Teller"),
            create_test_raw("100001", "Active", "Fee", "alice", "Teller"),
        ];

        let err = engine.run(&source, &[]).unwrap_err();

        assert!(matches!(err, ReconError::KeyCollision { side: Side::Source, .. }));
    }

    #[test]
    fn test_legacy_null_handling_keeps_null_rows() {
        let engine = ReconciliationEngine::with_rules(ValidationRules {
            null_handling: NullHandling::Legacy,
            ..ValidationRules::default()
        });
        let mut raw = create_test_raw("100001", "Active", "Deposit", "alice", "Teller");
        raw.set("designation", RawValue::Null);

        let report = engine.run(&[raw.clone()], &[raw]).unwrap();

        assert_eq!(report.source_valid[0].designation, "None");
        assert!(report.is_reconciled());
        assert_eq!(engine.rules().null_handling, NullHandling::Legacy);
    }

    #[test]
    fn test_strict_null_handling_drops_null_rows() {
        let engine = ReconciliationEngine::new();
        let mut raw = create_test_raw("100001", "Active", "Deposit", "alice", "Teller");
        raw.set("designation", RawValue::Null);

        let report = engine.run(&[raw], &[]).unwrap();

        assert!(report.source_valid.is_empty());
        assert_eq!(report.summary.source_rejected_count, 1);
    }
}
