// 📋 Report Assembler - package a reconciliation run for callers
//
// Three result sets (valid source, valid target, discrepancies) plus a
// numeric summary. Collections are always present, even when empty.

use crate::filter::{FilterOutcome, RejectedRecord};
use crate::reconciler::{Classification, DiscrepancyEntry, Membership};
use crate::record::{AccountRecord, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub run_id: Uuid,
    pub reconciled_at: DateTime<Utc>,
    pub source_valid_count: usize,
    pub target_valid_count: usize,
    pub discrepancy_count: usize,
    pub source_only_count: usize,
    pub target_only_count: usize,
    pub mismatched_count: usize,
    pub identical_count: usize,
    pub source_rejected_count: usize,
    pub target_rejected_count: usize,
    /// Sides whose valid set came out empty
    pub empty_sides: Vec<Side>,
}

impl Summary {
    pub fn is_reconciled(&self) -> bool {
        self.discrepancy_count == 0
    }

    pub fn row_counts_match(&self) -> bool {
        self.source_valid_count == self.target_valid_count
    }

    pub fn is_degenerate(&self) -> bool {
        !self.empty_sides.is_empty()
    }

    /// Metric rows for the summary export, in fixed order
    pub fn metrics(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("Source Valid Data Count", self.source_valid_count),
            ("Target Valid Data Count", self.target_valid_count),
            ("Discrepancies Count", self.discrepancy_count),
        ]
    }

    pub fn describe(&self) -> String {
        format!(
            "Run {}: source {} valid ({} rejected), target {} valid ({} rejected), {} discrepancies ({} source-only, {} target-only, {} mismatched), {} identical",
            self.run_id,
            self.source_valid_count,
            self.source_rejected_count,
            self.target_valid_count,
            self.target_rejected_count,
            self.discrepancy_count,
            self.source_only_count,
            self.target_only_count,
            self.mismatched_count,
            self.identical_count,
        )
    }
}

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub summary: Summary,
    pub source_valid: Vec<AccountRecord>,
    pub target_valid: Vec<AccountRecord>,
    pub discrepancies: Vec<DiscrepancyEntry>,
    pub source_rejected: Vec<RejectedRecord>,
    pub target_rejected: Vec<RejectedRecord>,
}

impl ReconciliationReport {
    pub fn is_reconciled(&self) -> bool {
        self.summary.is_reconciled()
    }

    pub fn valid(&self, side: Side) -> &[AccountRecord] {
        match side {
            Side::Source => &self.source_valid,
            Side::Target => &self.target_valid,
        }
    }

    pub fn rejected(&self, side: Side) -> &[RejectedRecord] {
        match side {
            Side::Source => &self.source_rejected,
            Side::Target => &self.target_rejected,
        }
    }
}

// ============================================================================
// REPORT ASSEMBLER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ReportAssembler;

impl ReportAssembler {
    pub fn new() -> Self {
        ReportAssembler
    }

    pub fn assemble(
        &self,
        source: FilterOutcome,
        target: FilterOutcome,
        classification: Classification,
    ) -> ReconciliationReport {
        let mut empty_sides = Vec::new();
        for (side, outcome) in [(Side::Source, &source), (Side::Target, &target)] {
            if outcome.valid.is_empty() {
                warn!(%side, fetched = outcome.total(), "no valid records on this side");
                empty_sides.push(side);
            }
        }

        let source_only_count = classification.count(Membership::SourceOnly);
        let target_only_count = classification.count(Membership::TargetOnly);
        let mismatched_count = classification.mismatched_count();
        let identical_count = classification.identical_count();
        let discrepancies = classification.into_discrepancies();

        let summary = Summary {
            run_id: Uuid::new_v4(),
            reconciled_at: Utc::now(),
            source_valid_count: source.valid.len(),
            target_valid_count: target.valid.len(),
            discrepancy_count: discrepancies.len(),
            source_only_count,
            target_only_count,
            mismatched_count,
            identical_count,
            source_rejected_count: source.rejected.len(),
            target_rejected_count: target.rejected.len(),
            empty_sides,
        };

        ReconciliationReport {
            summary,
            source_valid: source.valid,
            target_valid: target.valid,
            discrepancies,
            source_rejected: source.rejected,
            target_rejected: target.rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::Reconciler;

    fn create_test_outcome(records: Vec<AccountRecord>) -> FilterOutcome {
        FilterOutcome {
            valid: records,
            rejected: Vec::new(),
        }
    }

    fn create_test_record(account_number: &str, note_type: &str) -> AccountRecord {
        AccountRecord::new(account_number, "Active", note_type, "alice", "Teller")
    }

    fn assemble(source: Vec<AccountRecord>, target: Vec<AccountRecord>) -> ReconciliationReport {
        let classification = Reconciler::new().reconcile(&source, &target).unwrap();
        ReportAssembler::new().assemble(
            create_test_outcome(source),
            create_test_outcome(target),
            classification,
        )
    }

    #[test]
    fn test_valid_sets_pass_through_unchanged() {
        let source = vec![
            create_test_record("100002", "Fee"),
            create_test_record("100001", "Deposit"),
        ];
        let target = vec![create_test_record("100001", "Deposit")];

        let report = assemble(source.clone(), target.clone());

        assert_eq!(report.source_valid, source);
        assert_eq!(report.target_valid, target);
        assert_eq!(report.valid(Side::Source).len(), 2);
    }

    #[test]
    fn test_summary_counts() {
        let report = assemble(
            vec![
                create_test_record("100001", "Deposit"),
                create_test_record("100002", "Deposit"),
                create_test_record("100003", "Deposit"),
            ],
            vec![
                create_test_record("100001", "Deposit"),
                create_test_record("100002", "Withdrawal"),
                create_test_record("100004", "Deposit"),
            ],
        );
        let summary = &report.summary;

        assert_eq!(summary.source_valid_count, 3);
        assert_eq!(summary.target_valid_count, 3);
        assert_eq!(summary.discrepancy_count, 3);
        assert_eq!(summary.source_only_count, 1);
        assert_eq!(summary.target_only_count, 1);
        assert_eq!(summary.mismatched_count, 1);
        assert_eq!(summary.identical_count, 1);
        assert!(summary.row_counts_match());
        assert!(!summary.is_reconciled());
        assert!(!summary.is_degenerate());
    }

    #[test]
    fn test_empty_inputs_produce_well_formed_report() {
        let report = assemble(Vec::new(), Vec::new());

        assert!(report.source_valid.is_empty());
        assert!(report.target_valid.is_empty());
        assert!(report.discrepancies.is_empty());
        assert_eq!(report.summary.discrepancy_count, 0);
        assert_eq!(report.summary.empty_sides, vec![Side::Source, Side::Target]);
        assert!(report.summary.is_degenerate());
    }

    #[test]
    fn test_empty_target_is_flagged() {
        let report = assemble(vec![create_test_record("100001", "Deposit")], Vec::new());

        assert_eq!(report.target_valid.len(), 0);
        assert_eq!(report.discrepancies.len(), 1);
        assert_eq!(report.discrepancies[0].membership, Membership::SourceOnly);
        assert_eq!(report.summary.empty_sides, vec![Side::Target]);
    }

    #[test]
    fn test_metrics_order() {
        let report = assemble(vec![create_test_record("100001", "Deposit")], Vec::new());
        let metrics = report.summary.metrics();

        assert_eq!(
            metrics,
            vec![
                ("Source Valid Data Count", 1),
                ("Target Valid Data Count", 0),
                ("Discrepancies Count", 1),
            ]
        );
    }

    #[test]
    fn test_summary_serializes_to_json() {
        let report = assemble(vec![create_test_record("100001", "Deposit")], Vec::new());
        let json = serde_json::to_value(&report.summary).unwrap();

        assert_eq!(json["discrepancy_count"], 1);
        assert_eq!(json["empty_sides"][0], "target");
    }
}
