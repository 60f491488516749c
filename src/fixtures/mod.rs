//! Helpers for writing tests against a datastore.
//!
//! - [`verify_table`] / [`verify_column`] check a table's shape.
//! - [`temp_row`] and [`temp_writes`] undo their effects when they go out of
//!   scope, whether the test passes, fails or panics.
//! - [`raises`] and friends assert that a block fails with a given error type.
//! - [`gen_int`] and [`gen_str`] produce throwaway values.

use std::error::Error as StdError;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::harness::failure::{short_type_name, Failure, TestOutcome};

mod scoped;
pub mod store;

pub use scoped::{temp_row, temp_writes, Row, TempRow, TempWrites};
pub use store::{Column, Datastore, MemoryStore, RowData, RowId, StoreError};

/// Ways a table can differ from its expected shape.
///
/// Converts into a [`Failure`], so `verify_table(..)?` fails the test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableMismatch {
    /// The table does not exist.
    MissingTable(String),
    /// One problem per expected column.
    Columns(Vec<String>),
}

impl fmt::Display for TableMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableMismatch::MissingTable(name) => write!(f, "Table '{name}' not found."),
            TableMismatch::Columns(problems) => f.write_str(&problems.join("\n")),
        }
    }
}

impl From<TableMismatch> for Failure {
    fn from(mismatch: TableMismatch) -> Self {
        match mismatch {
            TableMismatch::MissingTable(_) => Failure::Message(mismatch.to_string()),
            TableMismatch::Columns(problems) => Failure::List(problems),
        }
    }
}

/// Check that `columns` contains `name` with type `column_type`.
///
/// Returns a readable problem description, or `None` when the column matches.
pub fn verify_column(columns: &[Column], name: &str, column_type: &str) -> Option<String> {
    match columns.iter().find(|c| c.name == name) {
        Some(c) if c.column_type == column_type => None,
        Some(c) => Some(format!(
            "column '{name}' must be of type '{column_type}' not '{}'",
            c.column_type
        )),
        None => Some(format!("column '{name}' not found")),
    }
}

/// Check that `table` exists and has every expected column.
///
/// Extra columns in the table are allowed.
pub fn verify_table(
    store: &dyn Datastore,
    table: &str,
    expected: &[Column],
) -> Result<(), TableMismatch> {
    let columns = match store.list_columns(table) {
        Ok(columns) => columns,
        Err(StoreError::TableNotFound(_)) => {
            return Err(TableMismatch::MissingTable(table.to_string()));
        }
        Err(e) => return Err(TableMismatch::Columns(vec![e.to_string()])),
    };

    let problems: Vec<String> = expected
        .iter()
        .filter_map(|c| verify_column(&columns, &c.name, &c.column_type))
        .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(TableMismatch::Columns(problems))
    }
}

/// Pass only if `block` fails with an error of type `E`.
///
/// ```
/// use autotest::fixtures::raises;
///
/// let outcome = raises::<std::num::ParseIntError, _>(|| {
///     "x".parse::<i32>()?;
///     Ok(())
/// });
/// assert!(outcome.is_ok());
/// ```
pub fn raises<E, F>(block: F) -> TestOutcome
where
    E: StdError + 'static,
    F: FnOnce() -> TestOutcome,
{
    let not_raised = format!("{} not raised.", short_type_name::<E>());
    check_raises::<E, _>(block(), |_| true, not_raised)
}

/// Like [`raises`], failing with `msg` when nothing is raised.
pub fn raises_with<E, F>(msg: impl Into<String>, block: F) -> TestOutcome
where
    E: StdError + 'static,
    F: FnOnce() -> TestOutcome,
{
    check_raises::<E, _>(block(), |_| true, msg.into())
}

/// Like [`raises`], additionally requiring the raised error to satisfy `pred`.
pub fn raises_where<E, P, F>(pred: P, block: F) -> TestOutcome
where
    E: StdError + 'static,
    P: FnOnce(&E) -> bool,
    F: FnOnce() -> TestOutcome,
{
    let not_raised = format!("{} not raised.", short_type_name::<E>());
    check_raises::<E, _>(block(), pred, not_raised)
}

fn check_raises<E, P>(outcome: TestOutcome, pred: P, not_raised: String) -> TestOutcome
where
    E: StdError + 'static,
    P: FnOnce(&E) -> bool,
{
    let expected = short_type_name::<E>();
    let failure = match outcome {
        Ok(()) => return Err(Failure::Message(not_raised)),
        // Assertion failures inside the block are the block's own verdict.
        Err(failure) if failure.is_assertion() => return Err(failure),
        Err(failure) => failure,
    };

    match failure.downcast_ref::<E>() {
        Some(err) => {
            if pred(err) {
                Ok(())
            } else {
                Err(Failure::message(format!(
                    "{expected} raised but did not match: {err}"
                )))
            }
        }
        None => Err(Failure::message(format!(
            "{} raised, expected {expected}",
            failure.kind().unwrap_or("Error")
        ))),
    }
}

/// Throwaway integer with at most `n_digits` digits (clamped to `1..=19`).
///
/// Not random in any cryptographic sense: it mixes the clock with its own
/// digit reversal.
pub fn gen_int(n_digits: u32) -> u64 {
    let n_digits = n_digits.clamp(1, 19);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let reversed: u128 = nanos
        .to_string()
        .chars()
        .rev()
        .collect::<String>()
        .parse()
        .unwrap_or_default();

    let modulus = 10_u128.pow(n_digits) - 1;
    let value = (nanos + reversed) % modulus;
    // modulus < 10^19 < u64::MAX
    u64::try_from(value).unwrap_or_default()
}

/// Throwaway lowercase hex string, `n_chars` long.
pub fn gen_str(n_chars: usize) -> String {
    let mut out = String::with_capacity(n_chars + 16);
    while out.len() < n_chars {
        out.push_str(&format!("{:016x}", gen_int(19)));
    }
    out.truncate(n_chars);
    out
}
