// ⚖️ Reconciler - align source and target rows by account number
//
// Full outer join on account_number, then a field-by-field comparison for
// keys present on both sides:
//
//   source_only  key only in source
//   target_only  key only in target
//   both         key on both sides; the four non-key fields are compared
//
// A key is a discrepancy unless it is on both sides with all four fields
// equal. Values are compared per key, never by row position.

use crate::error::{ReconError, Result};
use crate::record::{AccountRecord, Field, Side};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

// ============================================================================
// MEMBERSHIP
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    SourceOnly,
    TargetOnly,
    Both,
}

impl Membership {
    pub fn name(&self) -> &'static str {
        match self {
            Membership::SourceOnly => "source_only",
            Membership::TargetOnly => "target_only",
            Membership::Both => "both",
        }
    }
}

// ============================================================================
// FIELD MATCHES
// ============================================================================

/// Per-field equality for a key present on both sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMatches {
    pub account_status: bool,
    pub note_type: bool,
    pub updated_by: bool,
    pub designation: bool,
}

impl FieldMatches {
    pub fn compare(source: &AccountRecord, target: &AccountRecord) -> Self {
        FieldMatches {
            account_status: source.account_status == target.account_status,
            note_type: source.note_type == target.note_type,
            updated_by: source.updated_by == target.updated_by,
            designation: source.designation == target.designation,
        }
    }

    /// Match flag for one compared field; the key always matches itself
    pub fn get(&self, field: Field) -> bool {
        match field {
            Field::AccountNumber => true,
            Field::AccountStatus => self.account_status,
            Field::NoteType => self.note_type,
            Field::UpdatedBy => self.updated_by,
            Field::Designation => self.designation,
        }
    }

    pub fn all_match(&self) -> bool {
        Field::COMPARED.iter().all(|f| self.get(*f))
    }

    pub fn mismatched(&self) -> Vec<Field> {
        Field::COMPARED
            .into_iter()
            .filter(|f| !self.get(*f))
            .collect()
    }
}

// ============================================================================
// DISCREPANCY ENTRY
// ============================================================================

/// One key of the outer join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscrepancyEntry {
    pub account_number: String,
    pub membership: Membership,
    pub source: Option<AccountRecord>,
    pub target: Option<AccountRecord>,
    /// Present only when membership is `Both`
    pub matches: Option<FieldMatches>,
}

impl DiscrepancyEntry {
    pub fn is_discrepancy(&self) -> bool {
        match (self.membership, &self.matches) {
            (Membership::Both, Some(matches)) => !matches.all_match(),
            _ => true,
        }
    }

    pub fn mismatched_fields(&self) -> Vec<Field> {
        self.matches.map(|m| m.mismatched()).unwrap_or_default()
    }

    pub fn describe(&self) -> String {
        match self.membership {
            Membership::SourceOnly => format!("{}: missing in target", self.account_number),
            Membership::TargetOnly => format!("{}: missing in source", self.account_number),
            Membership::Both => {
                let fields: Vec<&str> = self.mismatched_fields().iter().map(|f| f.name()).collect();
                if fields.is_empty() {
                    format!("{}: identical", self.account_number)
                } else {
                    format!("{}: differs on {}", self.account_number, fields.join(", "))
                }
            }
        }
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Every key of the outer join, ordered by account number
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub entries: Vec<DiscrepancyEntry>,
}

impl Classification {
    pub fn discrepancies(&self) -> impl Iterator<Item = &DiscrepancyEntry> {
        self.entries.iter().filter(|e| e.is_discrepancy())
    }

    pub fn into_discrepancies(self) -> Vec<DiscrepancyEntry> {
        self.entries.into_iter().filter(|e| e.is_discrepancy()).collect()
    }

    pub fn count(&self, membership: Membership) -> usize {
        self.entries
            .iter()
            .filter(|e| e.membership == membership)
            .count()
    }

    /// Keys on both sides with at least one differing field
    pub fn mismatched_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.membership == Membership::Both && e.is_discrepancy())
            .count()
    }

    pub fn identical_count(&self) -> usize {
        self.count(Membership::Both) - self.mismatched_count()
    }

    pub fn get(&self, account_number: &str) -> Option<&DiscrepancyEntry> {
        self.entries
            .binary_search_by(|e| e.account_number.as_str().cmp(account_number))
            .ok()
            .map(|i| &self.entries[i])
    }
}

// ============================================================================
// RECONCILER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Reconciler;

impl Reconciler {
    pub fn new() -> Self {
        Reconciler
    }

    /// Classify every account number found in either validated set.
    ///
    /// Fails with `KeyCollision` if a set repeats an account number, and with
    /// `SchemaViolation` if a row has an empty account number.
    pub fn reconcile(
        &self,
        source: &[AccountRecord],
        target: &[AccountRecord],
    ) -> Result<Classification> {
        let source_index = index_by_key(Side::Source, source)?;
        let target_index = index_by_key(Side::Target, target)?;

        let keys: BTreeSet<&str> = source_index
            .keys()
            .chain(target_index.keys())
            .copied()
            .collect();

        let entries: Vec<DiscrepancyEntry> = keys
            .into_iter()
            .map(|key| classify(key, source_index.get(key), target_index.get(key)))
            .collect();

        let classification = Classification { entries };

        info!(
            keys = classification.entries.len(),
            source_only = classification.count(Membership::SourceOnly),
            target_only = classification.count(Membership::TargetOnly),
            mismatched = classification.mismatched_count(),
            identical = classification.identical_count(),
            "reconciliation complete"
        );

        Ok(classification)
    }
}

fn index_by_key(side: Side, records: &[AccountRecord]) -> Result<BTreeMap<&str, &AccountRecord>> {
    let mut index = BTreeMap::new();

    for (row, record) in records.iter().enumerate() {
        if record.key().is_empty() {
            return Err(ReconError::SchemaViolation {
                side,
                row,
                field: Field::AccountNumber,
            });
        }
        if index.insert(record.key(), record).is_some() {
            return Err(ReconError::KeyCollision {
                side,
                account_number: record.key().to_string(),
            });
        }
    }

    Ok(index)
}

fn classify(
    key: &str,
    source: Option<&&AccountRecord>,
    target: Option<&&AccountRecord>,
) -> DiscrepancyEntry {
    let (membership, matches) = match (source, target) {
        (Some(s), Some(t)) => (Membership::Both, Some(FieldMatches::compare(s, t))),
        (Some(_), None) => (Membership::SourceOnly, None),
        // keys come from the union of both indexes, so at least one side is set
        (None, _) => (Membership::TargetOnly, None),
    };

    DiscrepancyEntry {
        account_number: key.to_string(),
        membership,
        source: source.map(|r| (*r).clone()),
        target: target.map(|r| (*r).clone()),
        matches,
    }
}
