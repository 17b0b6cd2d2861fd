// 🗄️ Database collaborators - fetch account rows, persist run results
//
// Connections are opened by the caller and passed in; nothing here holds a
// connection between calls.

use crate::error::{ReconError, Result};
use crate::record::{Field, RawRecord, RawValue};
use crate::report::ReconciliationReport;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params, Connection, OpenFlags, ToSql};
use std::path::Path;
use tracing::{debug, info};

/// Accounts joined with their notes and external attributes, one row per account
pub const ACCOUNTS_QUERY: &str = "SELECT
        acc.account_number,
        acc.account_status,
        notes.note_type,
        notes.updated_by,
        ext.designation
    FROM accounts AS acc
    JOIN AccountNotes AS notes ON acc.account_number = notes.account_number
    JOIN AccountExternal AS ext ON acc.account_number = ext.account_number";

impl ToSql for RawValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            RawValue::Null => ToSqlOutput::Owned(Value::Null),
            RawValue::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            RawValue::Real(r) => ToSqlOutput::Owned(Value::Real(*r)),
            RawValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

fn raw_value(value: ValueRef<'_>) -> RawValue {
    match value {
        ValueRef::Null => RawValue::Null,
        ValueRef::Integer(i) => RawValue::Integer(i),
        ValueRef::Real(r) => RawValue::Real(r),
        ValueRef::Text(t) | ValueRef::Blob(t) => {
            RawValue::Text(String::from_utf8_lossy(t).into_owned())
        }
    }
}

// ============================================================================
// FETCH
// ============================================================================

/// Open a data source without write access
pub fn open_source(path: &Path) -> Result<Connection> {
    if !path.exists() {
        return Err(ReconError::Config(format!(
            "database not found: {}",
            path.display()
        )));
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok(conn)
}

/// Run `query` and keep every returned column by name
pub fn fetch_records(conn: &Connection, query: &str) -> Result<Vec<RawRecord>> {
    let mut stmt = conn.prepare(query)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let records = stmt
        .query_map([], |row| {
            let mut raw = RawRecord::new();
            for (i, name) in columns.iter().enumerate() {
                raw.set(name, raw_value(row.get_ref(i)?));
            }
            Ok(raw)
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    debug!(rows = records.len(), columns = ?columns, "fetched records");

    Ok(records)
}

// ============================================================================
// ACCOUNT TABLES (local dry runs)
// ============================================================================

pub fn setup_account_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS accounts (
            account_number TEXT PRIMARY KEY,
            account_status TEXT
        );
        CREATE TABLE IF NOT EXISTS AccountNotes (
            account_number TEXT NOT NULL REFERENCES accounts(account_number),
            note_type TEXT,
            updated_by TEXT
        );
        CREATE TABLE IF NOT EXISTS AccountExternal (
            account_number TEXT NOT NULL REFERENCES accounts(account_number),
            designation TEXT
        );",
    )?;
    Ok(())
}

/// Spread one row across the three account tables. Absent fields are
/// stored as NULL.
pub fn insert_account(conn: &Connection, raw: &RawRecord) -> Result<()> {
    let value = |field: Field| raw.get(field).cloned().unwrap_or(RawValue::Null);
    let account_number = value(Field::AccountNumber);

    conn.execute(
        "INSERT INTO accounts (account_number, account_status) VALUES (?1, ?2)",
        params![account_number, value(Field::AccountStatus)],
    )?;
    conn.execute(
        "INSERT INTO AccountNotes (account_number, note_type, updated_by) VALUES (?1, ?2, ?3)",
        params![account_number, value(Field::NoteType), value(Field::UpdatedBy)],
    )?;
    conn.execute(
        "INSERT INTO AccountExternal (account_number, designation) VALUES (?1, ?2)",
        params![account_number, value(Field::Designation)],
    )?;

    Ok(())
}

pub fn insert_accounts(conn: &mut Connection, records: &[RawRecord]) -> Result<usize> {
    let tx = conn.transaction()?;
    for raw in records {
        insert_account(&tx, raw)?;
    }
    tx.commit()?;

    info!(rows = records.len(), "inserted account rows");
    Ok(records.len())
}

/// Read account rows from a CSV file with the five field columns as header.
/// Empty cells become NULL.
pub fn load_csv(csv_path: &Path) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::Reader::from_path(csv_path)?;
    let headers = rdr.headers()?.clone();

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let mut raw = RawRecord::new();
        for (name, cell) in headers.iter().zip(row.iter()) {
            let value = if cell.is_empty() {
                RawValue::Null
            } else {
                RawValue::from(cell)
            };
            raw.set(name, value);
        }
        records.push(raw);
    }

    Ok(records)
}

// ============================================================================
// RESULTS TABLE
// ============================================================================

pub fn setup_results_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS validation_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            result_type TEXT NOT NULL,
            client_id TEXT,
            account_number TEXT,
            bank_account_id TEXT,
            active_flag TEXT,
            update_datetime DATETIME
        )",
        [],
    )?;
    Ok(())
}

/// Write one row per valid source record, valid target record and
/// discrepancy. `client_id` carries the run id.
pub fn insert_results(conn: &mut Connection, report: &ReconciliationReport) -> Result<usize> {
    let run_id = report.summary.run_id.to_string();
    let updated = report.summary.reconciled_at.to_rfc3339();

    let tx = conn.transaction()?;
    let mut inserted = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO validation_results (
                result_type, client_id, account_number, bank_account_id, active_flag, update_datetime
            ) VALUES (?1, ?2, ?3, NULL, ?4, ?5)",
        )?;

        for record in &report.source_valid {
            stmt.execute(params!["Source", run_id, record.account_number, record.account_status, updated])?;
            inserted += 1;
        }
        for record in &report.target_valid {
            stmt.execute(params!["Target", run_id, record.account_number, record.account_status, updated])?;
            inserted += 1;
        }
        for entry in &report.discrepancies {
            let active_flag = entry
                .source
                .as_ref()
                .or(entry.target.as_ref())
                .map(|r| r.account_status.as_str());
            stmt.execute(params!["Discrepancy", run_id, entry.account_number, active_flag, updated])?;
            inserted += 1;
        }
    }
    tx.commit()?;

    info!(rows = inserted, run_id = %run_id, "wrote validation results");
    Ok(inserted)
}

pub fn count_results(conn: &Connection, run_id: &str, result_type: &str) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM validation_results WHERE client_id = ?1 AND result_type = ?2",
        params![run_id, result_type],
        |row| row.get(0),
    )?;
    Ok(count)
}
