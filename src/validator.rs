// ✅ Field Validator - per-field constraints for one account row
//
// Every rule runs for every row; a failing field never hides the others.
//
// Rules:
//   account_number  length == account_number_length (6)
//   account_status  == required_status ("Active", case-sensitive)
//   note_type       present after normalization
//   updated_by      present after normalization
//   designation     present after normalization

use crate::record::{AccountRecord, Field, RawRecord, RawValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// RULES
// ============================================================================

/// Order of the null check relative to string normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullHandling {
    /// Null check first: a null value fails its field
    #[default]
    Strict,
    /// Normalize first: a null becomes "None" and counts as present
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    /// Expected account number length, in characters
    pub account_number_length: usize,
    pub required_status: String,
    pub null_handling: NullHandling,
}

impl Default for ValidationRules {
    fn default() -> Self {
        ValidationRules {
            account_number_length: 6,
            required_status: "Active".to_string(),
            null_handling: NullHandling::Strict,
        }
    }
}

// ============================================================================
// CHECK RESULTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCheck {
    pub field: Field,
    pub passed: bool,
    pub reason: String,
}

impl FieldCheck {
    pub fn pass(field: Field, reason: &str) -> Self {
        FieldCheck {
            field,
            passed: true,
            reason: reason.to_string(),
        }
    }

    pub fn fail(field: Field, reason: &str) -> Self {
        FieldCheck {
            field,
            passed: false,
            reason: reason.to_string(),
        }
    }
}

/// All five checks for one row plus its normalized form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldReport {
    pub checks: Vec<FieldCheck>,
    pub record: AccountRecord,
}

impl FieldReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &FieldCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }

    /// Field name → pass/fail
    pub fn verdicts(&self) -> BTreeMap<Field, bool> {
        self.checks.iter().map(|c| (c.field, c.passed)).collect()
    }

    pub fn summary(&self) -> String {
        let failed: Vec<String> = self
            .failures()
            .map(|c| format!("{} ({})", c.field, c.reason))
            .collect();

        if failed.is_empty() {
            format!("{}: all checks passed", self.record.account_number)
        } else {
            format!("{}: {}", self.record.account_number, failed.join(", "))
        }
    }
}

// ============================================================================
// FIELD VALIDATOR
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct FieldValidator {
    rules: ValidationRules,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: ValidationRules) -> Self {
        FieldValidator { rules }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Run all five checks against a raw row.
    ///
    /// Returns the first absent field as the error; an absent column is a
    /// contract breach by the data source, not a validation outcome.
    pub fn validate(&self, raw: &RawRecord) -> Result<FieldReport, Field> {
        let mut values: Vec<&RawValue> = Vec::with_capacity(Field::ALL.len());
        for field in Field::ALL {
            values.push(raw.get(field).ok_or(field)?);
        }

        let checks = Field::ALL
            .iter()
            .zip(values.iter())
            .map(|(field, value)| self.check_field(*field, value))
            .collect();

        let record = AccountRecord {
            account_number: values[0].normalize(),
            account_status: values[1].normalize(),
            note_type: values[2].normalize(),
            updated_by: values[3].normalize(),
            designation: values[4].normalize(),
        };

        Ok(FieldReport { checks, record })
    }

    /// Same checks for an already-normalized row
    pub fn validate_record(&self, record: &AccountRecord) -> FieldReport {
        let checks = Field::ALL
            .iter()
            .map(|field| self.check_field(*field, &RawValue::from(record.value(*field))))
            .collect();

        FieldReport {
            checks,
            record: record.clone(),
        }
    }

    fn check_field(&self, field: Field, value: &RawValue) -> FieldCheck {
        if value.is_null() && self.rules.null_handling == NullHandling::Strict {
            return FieldCheck::fail(field, "value is null");
        }

        let text = value.normalize();
        match field {
            Field::AccountNumber => self.check_account_number(&text),
            Field::AccountStatus => self.check_account_status(&text),
            Field::NoteType | Field::UpdatedBy | Field::Designation => {
                check_present(field, &text)
            }
        }
    }

    fn check_account_number(&self, text: &str) -> FieldCheck {
        let expected = self.rules.account_number_length;
        let actual = text.chars().count();

        if actual == expected {
            FieldCheck::pass(Field::AccountNumber, "length ok")
        } else {
            FieldCheck::fail(
                Field::AccountNumber,
                &format!("length {} (expected {})", actual, expected),
            )
        }
    }

    fn check_account_status(&self, text: &str) -> FieldCheck {
        if text == self.rules.required_status {
            FieldCheck::pass(Field::AccountStatus, "status ok")
        } else {
            FieldCheck::fail(
                Field::AccountStatus,
                &format!("status '{}' (expected '{}')", text, self.rules.required_status),
            )
        }
    }
}

fn check_present(field: Field, text: &str) -> FieldCheck {
    if text.trim().is_empty() {
        FieldCheck::fail(field, "value is empty")
    } else {
        FieldCheck::pass(field, "present")
    }
}
