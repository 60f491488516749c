//! Row/table datastore abstraction and an in-memory implementation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Column values of a row, keyed by column name.
pub type RowData = BTreeMap<String, Value>;

/// Errors raised by a datastore.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// No table with that name.
    #[error("table '{0}' not found")]
    TableNotFound(String),

    /// The table has no such column.
    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// The row holds no value for that column.
    #[error("row {row} has no column '{column}'")]
    FieldNotFound { row: RowId, column: String },

    /// The row was deleted (or never existed).
    #[error("row {0} has been deleted")]
    RowDeleted(RowId),

    /// `abort`/`commit` without an open transaction.
    #[error("no transaction in progress")]
    NoTransaction,

    /// `begin` while a transaction is already open.
    #[error("a transaction is already in progress")]
    TransactionActive,
}

/// Identifier of a row, unique across tables. Renders as `[table,row]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId {
    table: u32,
    row: u64,
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.table, self.row)
    }
}

/// Column description, as listed by [`Datastore::list_columns`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }
}

/// A row/table datastore with single-level transactions.
pub trait Datastore: Send + Sync {
    /// Names of all tables.
    fn table_names(&self) -> Vec<String>;

    /// Columns of a table, in declaration order.
    fn list_columns(&self, table: &str) -> Result<Vec<Column>, StoreError>;

    /// Insert a row; columns not given are null.
    fn add_row(&self, table: &str, fields: RowData) -> Result<RowId, StoreError>;

    /// Current values of a row, one entry per column.
    fn get_row(&self, id: RowId) -> Result<RowData, StoreError>;

    /// Set one column of a row.
    fn update_row(&self, id: RowId, column: &str, value: Value) -> Result<(), StoreError>;

    /// Delete a row.
    fn delete_row(&self, id: RowId) -> Result<(), StoreError>;

    /// Ids of every row in a table.
    fn search(&self, table: &str) -> Result<Vec<RowId>, StoreError>;

    /// First row whose `column` equals `value`.
    fn find_row(&self, table: &str, column: &str, value: &Value) -> Result<Option<RowId>, StoreError>;

    /// Open a transaction.
    fn begin(&self) -> Result<(), StoreError>;

    /// Discard every write since [`Datastore::begin`].
    fn abort(&self) -> Result<(), StoreError>;

    /// Keep every write since [`Datastore::begin`].
    fn commit(&self) -> Result<(), StoreError>;

    /// Whether a table exists.
    fn has_table(&self, table: &str) -> bool {
        self.table_names().iter().any(|name| name == table)
    }
}

#[derive(Debug, Clone)]
struct Table {
    id: u32,
    name: String,
    columns: Vec<Column>,
    rows: BTreeMap<u64, RowData>,
}

impl Table {
    fn check_column(&self, column: &str) -> Result<(), StoreError> {
        if self.columns.iter().any(|c| c.name == column) {
            Ok(())
        } else {
            Err(StoreError::ColumnNotFound {
                table: self.name.clone(),
                column: column.to_string(),
            })
        }
    }
}

#[derive(Debug, Default, Clone)]
struct Tables {
    tables: Vec<Table>,
    next_row: u64,
}

impl Tables {
    fn by_name(&self, name: &str) -> Result<&Table, StoreError> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()))
    }

    fn by_name_mut(&mut self, name: &str) -> Result<&mut Table, StoreError> {
        self.tables
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()))
    }

    fn row(&self, id: RowId) -> Result<&RowData, StoreError> {
        self.tables
            .iter()
            .find(|t| t.id == id.table)
            .and_then(|t| t.rows.get(&id.row))
            .ok_or(StoreError::RowDeleted(id))
    }

    fn table_of_mut(&mut self, id: RowId) -> Result<&mut Table, StoreError> {
        self.tables
            .iter_mut()
            .find(|t| t.id == id.table)
            .ok_or(StoreError::RowDeleted(id))
    }
}

#[derive(Debug, Default)]
struct State {
    current: Tables,
    snapshot: Option<Tables>,
}

/// In-memory [`Datastore`] with snapshot transactions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`MemoryStore::create_table`].
    pub fn with_table(self, name: &str, columns: Vec<Column>) -> Self {
        self.create_table(name, columns);
        self
    }

    /// Create (or replace) a table.
    pub fn create_table(&self, name: &str, columns: Vec<Column>) {
        let mut state = self.lock();
        let tables = &mut state.current;
        let id = tables.tables.iter().map(|t| t.id).max().map_or(1, |max| max + 1);
        tables.tables.retain(|t| t.name != name);
        tables.tables.push(Table {
            id,
            name: name.to_string(),
            columns,
            rows: BTreeMap::new(),
        });
    }

    /// Whether a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.lock().snapshot.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test must not take the store down with it.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Datastore for MemoryStore {
    fn table_names(&self) -> Vec<String> {
        self.lock()
            .current
            .tables
            .iter()
            .map(|t| t.name.clone())
            .collect()
    }

    fn list_columns(&self, table: &str) -> Result<Vec<Column>, StoreError> {
        Ok(self.lock().current.by_name(table)?.columns.clone())
    }

    fn add_row(&self, table: &str, fields: RowData) -> Result<RowId, StoreError> {
        let mut state = self.lock();
        let tables = &mut state.current;
        let row = tables.next_row + 1;
        let target = tables.by_name_mut(table)?;

        for column in fields.keys() {
            target.check_column(column)?;
        }
        let mut data: RowData = target
            .columns
            .iter()
            .map(|c| (c.name.clone(), Value::Null))
            .collect();
        data.extend(fields);

        let id = RowId {
            table: target.id,
            row,
        };
        target.rows.insert(row, data);
        tables.next_row = row;
        Ok(id)
    }

    fn get_row(&self, id: RowId) -> Result<RowData, StoreError> {
        self.lock().current.row(id).cloned()
    }

    fn update_row(&self, id: RowId, column: &str, value: Value) -> Result<(), StoreError> {
        let mut state = self.lock();
        let table = state.current.table_of_mut(id)?;
        table.check_column(column)?;
        let row = table.rows.get_mut(&id.row).ok_or(StoreError::RowDeleted(id))?;
        row.insert(column.to_string(), value);
        Ok(())
    }

    fn delete_row(&self, id: RowId) -> Result<(), StoreError> {
        let mut state = self.lock();
        let table = state.current.table_of_mut(id)?;
        table
            .rows
            .remove(&id.row)
            .map(|_| ())
            .ok_or(StoreError::RowDeleted(id))
    }

    fn search(&self, table: &str) -> Result<Vec<RowId>, StoreError> {
        let state = self.lock();
        let table = state.current.by_name(table)?;
        Ok(table
            .rows
            .keys()
            .map(|&row| RowId {
                table: table.id,
                row,
            })
            .collect())
    }

    fn find_row(&self, table: &str, column: &str, value: &Value) -> Result<Option<RowId>, StoreError> {
        let state = self.lock();
        let table = state.current.by_name(table)?;
        table.check_column(column)?;
        Ok(table
            .rows
            .iter()
            .find(|(_, data)| data.get(column) == Some(value))
            .map(|(&row, _)| RowId {
                table: table.id,
                row,
            }))
    }

    fn begin(&self) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.snapshot.is_some() {
            return Err(StoreError::TransactionActive);
        }
        state.snapshot = Some(state.current.clone());
        Ok(())
    }

    fn abort(&self) -> Result<(), StoreError> {
        let mut state = self.lock();
        let snapshot = state.snapshot.take().ok_or(StoreError::NoTransaction)?;
        // Row ids stay unique even across aborted transactions.
        let next_row = state.current.next_row;
        state.current = snapshot;
        state.current.next_row = next_row;
        Ok(())
    }

    fn commit(&self) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.snapshot.take().ok_or(StoreError::NoTransaction)?;
        Ok(())
    }
}
