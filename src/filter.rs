// 🧹 Validity Filter - keep only rows that pass every field check
//
// Order-preserving partition of one record set. Rejected rows are handed
// back with their failing checks so the caller can report them.

use crate::error::{ReconError, Result};
use crate::record::{AccountRecord, RawRecord, Side};
use crate::validator::{FieldCheck, FieldValidator};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A row that failed at least one field check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRecord {
    /// Zero-based position in the input set
    pub row: usize,
    pub record: AccountRecord,
    pub failures: Vec<FieldCheck>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOutcome {
    pub valid: Vec<AccountRecord>,
    pub rejected: Vec<RejectedRecord>,
}

impl FilterOutcome {
    pub fn total(&self) -> usize {
        self.valid.len() + self.rejected.len()
    }
}

pub struct ValidityFilter {
    validator: FieldValidator,
}

impl ValidityFilter {
    pub fn new(validator: FieldValidator) -> Self {
        ValidityFilter { validator }
    }

    pub fn validator(&self) -> &FieldValidator {
        &self.validator
    }

    /// Valid rows only, in input order
    pub fn filter(&self, side: Side, records: &[RawRecord]) -> Result<Vec<AccountRecord>> {
        Ok(self.partition(side, records)?.valid)
    }

    /// Split a record set into valid and rejected rows.
    ///
    /// A row missing one of the five columns aborts the whole set.
    pub fn partition(&self, side: Side, records: &[RawRecord]) -> Result<FilterOutcome> {
        let mut outcome = FilterOutcome::default();

        for (row, raw) in records.iter().enumerate() {
            let report = self
                .validator
                .validate(raw)
                .map_err(|field| ReconError::SchemaViolation { side, row, field })?;

            if report.passed() {
                outcome.valid.push(report.record);
            } else {
                debug!(%side, row, "rejected {}", report.summary());
                let failures = report.failures().cloned().collect();
                outcome.rejected.push(RejectedRecord {
                    row,
                    record: report.record,
                    failures,
                });
            }
        }

        info!(
            %side,
            total = outcome.total(),
            valid = outcome.valid.len(),
            rejected = outcome.rejected.len(),
            "validity filter complete"
        );

        Ok(outcome)
    }

    /// Re-check already-normalized rows
    pub fn refilter(&self, records: &[AccountRecord]) -> Vec<AccountRecord> {
        records
            .iter()
            .filter(|r| self.validator.validate_record(r).passed())
            .cloned()
            .collect()
    }
}

impl Default for ValidityFilter {
    fn default() -> Self {
        Self::new(FieldValidator::new())
    }
}
