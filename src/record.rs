// 🧾 Record Model - one account row as fetched and as validated
//
// Raw rows keep the database's own value types (nulls included) so the
// validator can decide how to treat them. Validated rows are plain strings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// FIELDS
// ============================================================================

/// The five account fields, in column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    AccountNumber,
    AccountStatus,
    NoteType,
    UpdatedBy,
    Designation,
}

impl Field {
    /// Every field a record must carry
    pub const ALL: [Field; 5] = [
        Field::AccountNumber,
        Field::AccountStatus,
        Field::NoteType,
        Field::UpdatedBy,
        Field::Designation,
    ];

    /// Non-key fields compared between source and target
    pub const COMPARED: [Field; 4] = [
        Field::AccountStatus,
        Field::NoteType,
        Field::UpdatedBy,
        Field::Designation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::AccountNumber => "account_number",
            Field::AccountStatus => "account_status",
            Field::NoteType => "note_type",
            Field::UpdatedBy => "updated_by",
            Field::Designation => "designation",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// SIDE
// ============================================================================

/// Which database a record set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Source,
    Target,
}

impl Side {
    pub fn name(&self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Target => "target",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// RAW VALUES
// ============================================================================

/// A column value exactly as the data source returned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// Text a null turns into when normalized before the presence check
pub const NULL_TEXT: &str = "None";

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// String form of the value. Integers print without decoration, reals
    /// always keep a fractional part, nulls become `"None"`.
    pub fn normalize(&self) -> String {
        match self {
            RawValue::Null => NULL_TEXT.to_string(),
            RawValue::Integer(i) => i.to_string(),
            RawValue::Real(r) => format!("{:?}", r),
            RawValue::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawValue::Null)
    }
}

// ============================================================================
// RAW RECORD
// ============================================================================

/// One fetched row keyed by column name. Columns outside the five account
/// fields are kept but ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub columns: BTreeMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: Field, value: impl Into<RawValue>) -> Self {
        self.set(field.name(), value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<RawValue>) {
        self.columns.insert(column.to_string(), value.into());
    }

    pub fn get(&self, field: Field) -> Option<&RawValue> {
        self.columns.get(field.name())
    }

    /// First account field this row does not carry at all
    pub fn missing_field(&self) -> Option<Field> {
        Field::ALL.into_iter().find(|f| self.get(*f).is_none())
    }
}

impl From<&AccountRecord> for RawRecord {
    fn from(record: &AccountRecord) -> Self {
        let mut raw = RawRecord::new();
        for field in Field::ALL {
            raw.set(field.name(), record.value(field));
        }
        raw
    }
}

// ============================================================================
// ACCOUNT RECORD
// ============================================================================

/// A normalized account row: every field is text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub account_number: String,
    pub account_status: String,
    pub note_type: String,
    pub updated_by: String,
    pub designation: String,
}

impl AccountRecord {
    pub fn new(
        account_number: &str,
        account_status: &str,
        note_type: &str,
        updated_by: &str,
        designation: &str,
    ) -> Self {
        AccountRecord {
            account_number: account_number.to_string(),
            account_status: account_status.to_string(),
            note_type: note_type.to_string(),
            updated_by: updated_by.to_string(),
            designation: designation.to_string(),
        }
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::AccountNumber => &self.account_number,
            Field::AccountStatus => &self.account_status,
            Field::NoteType => &self.note_type,
            Field::UpdatedBy => &self.updated_by,
            Field::Designation => &self.designation,
        }
    }

    /// Key used to align source and target rows
    pub fn key(&self) -> &str {
        &self.account_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.name()), Some(field));
        }
        assert_eq!(Field::from_name("client_id"), None);
    }

    #[test]
    fn test_compared_fields_exclude_key() {
        assert!(!Field::COMPARED.contains(&Field::AccountNumber));
        assert_eq!(Field::COMPARED.len(), 4);
    }

    #[test]
    fn test_normalize_absorbs_source_types() {
        assert_eq!(RawValue::Integer(100001).normalize(), "100001");
        assert_eq!(RawValue::Real(12.0).normalize(), "12.0");
        assert_eq!(RawValue::Null.normalize(), "None");
        assert_eq!(RawValue::from("Teller").normalize(), "Teller");
    }

    #[test]
    fn test_option_into_raw_value() {
        let missing: Option<&str> = None;
        assert_eq!(RawValue::from(missing), RawValue::Null);
        assert_eq!(RawValue::from(Some("alice")), RawValue::from("alice"));
    }

    #[test]
    fn test_missing_field_detection() {
        let raw = RawRecord::new()
            .with(Field::AccountNumber, "100001")
            .with(Field::AccountStatus, "Active")
            .with(Field::NoteType, "Deposit")
            .with(Field::UpdatedBy, RawValue::Null);

        // Null is present; designation is absent
        assert_eq!(raw.missing_field(), Some(Field::Designation));
    }

    #[test]
    fn test_account_record_to_raw_keeps_all_fields() {
        let record = AccountRecord::new("100001", "Active", "Deposit", "alice", "Teller");
        let raw = RawRecord::from(&record);

        assert_eq!(raw.missing_field(), None);
        assert_eq!(raw.get(Field::UpdatedBy), Some(&RawValue::from("alice")));
    }
}
