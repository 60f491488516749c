//! Scoped fixtures that clean up after themselves on every exit path.

use std::ops::Deref;

use serde_json::Value;

use super::store::{Datastore, RowData, RowId, StoreError};

/// Handle to a stored row.
///
/// The handle stays usable after the row is deleted; every access then fails
/// with [`StoreError::RowDeleted`].
#[derive(Clone, Copy)]
pub struct Row<'s> {
    store: &'s dyn Datastore,
    id: RowId,
}

impl<'s> Row<'s> {
    /// Wrap an existing row id.
    pub fn new(store: &'s dyn Datastore, id: RowId) -> Self {
        Self { store, id }
    }

    /// Row identifier.
    pub fn id(&self) -> RowId {
        self.id
    }

    /// Row identifier, failing if the row is gone.
    pub fn get_id(&self) -> Result<RowId, StoreError> {
        self.store.get_row(self.id).map(|_| self.id)
    }

    /// All column values.
    pub fn data(&self) -> Result<RowData, StoreError> {
        self.store.get_row(self.id)
    }

    /// One column value.
    pub fn get(&self, column: &str) -> Result<Value, StoreError> {
        let mut data = self.data()?;
        data.remove(column).ok_or_else(|| StoreError::FieldNotFound {
            row: self.id,
            column: column.to_string(),
        })
    }

    /// Set one column value.
    pub fn set(&self, column: &str, value: impl Into<Value>) -> Result<(), StoreError> {
        self.store.update_row(self.id, column, value.into())
    }

    /// Delete the row.
    pub fn delete(&self) -> Result<(), StoreError> {
        self.store.delete_row(self.id)
    }
}

impl std::fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Row").field("id", &self.id).finish()
    }
}

/// A row that is deleted when the guard goes out of scope.
///
/// ```
/// use autotest::fixtures::{temp_row, Column, MemoryStore, RowData};
///
/// let store = MemoryStore::new().with_table("t", vec![Column::new("name", "string")]);
/// let row = {
///     let guard = temp_row(&store, "t", RowData::new()).unwrap();
///     assert!(guard.get_id().is_ok());
///     guard.row()
/// };
/// assert!(row.get_id().is_err());
/// ```
#[must_use = "the row is deleted as soon as the guard is dropped"]
pub struct TempRow<'s> {
    row: Row<'s>,
}

impl<'s> TempRow<'s> {
    /// Copy of the row handle that outlives the guard.
    pub fn row(&self) -> Row<'s> {
        self.row
    }
}

impl<'s> Deref for TempRow<'s> {
    type Target = Row<'s>;

    fn deref(&self) -> &Self::Target {
        &self.row
    }
}

impl Drop for TempRow<'_> {
    fn drop(&mut self) {
        match self.row.delete() {
            // Deleted inside the scope already.
            Ok(()) | Err(StoreError::RowDeleted(_)) => {}
            Err(e) => tracing::warn!(row = %self.row.id(), error = %e, "failed to delete temporary row"),
        }
    }
}

/// Create a row in `table` that is deleted when the returned guard drops.
pub fn temp_row<'s>(store: &'s dyn Datastore, table: &str, fields: RowData) -> Result<TempRow<'s>, StoreError> {
    let id = store.add_row(table, fields)?;
    tracing::trace!(table, row = %id, "created temporary row");
    Ok(TempRow {
        row: Row::new(store, id),
    })
}

/// An open transaction that is aborted when the guard goes out of scope.
#[must_use = "the writes are discarded as soon as the guard is dropped"]
pub struct TempWrites<'s> {
    store: &'s dyn Datastore,
}

impl Drop for TempWrites<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.store.abort() {
            tracing::warn!(error = %e, "failed to abort temporary writes");
        }
    }
}

/// Open a transaction whose writes are discarded when the returned guard drops.
pub fn temp_writes(store: &dyn Datastore) -> Result<TempWrites<'_>, StoreError> {
    store.begin()?;
    Ok(TempWrites { store })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::store::{Column, MemoryStore};
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::new().with_table(
            "items",
            vec![Column::new("label", "string"), Column::new("count", "number")],
        )
    }

    #[test]
    fn test_temp_row_deleted_on_scope_exit() {
        let store = store();
        let row = {
            let guard = temp_row(&store, "items", RowData::new()).unwrap();
            guard.set("label", "x").unwrap();
            assert_eq!(guard.get("label").unwrap(), json!("x"));
            guard.row()
        };
        assert_eq!(row.get_id(), Err(StoreError::RowDeleted(row.id())));
    }

    #[test]
    fn test_row_get_unknown_column_names_the_row() {
        let store = store();
        let row = Row::new(&store, store.add_row("items", RowData::new()).unwrap());
        let err = row.get("colour").unwrap_err();
        assert_eq!(
            err,
            StoreError::FieldNotFound {
                row: row.id(),
                column: "colour".to_string(),
            }
        );
        assert_eq!(err.to_string(), format!("row {} has no column 'colour'", row.id()));
    }

    #[test]
    fn test_temp_row_deleted_on_early_return() {
        fn body(store: &MemoryStore, seen: &mut Option<RowId>) -> Result<(), StoreError> {
            let guard = temp_row(store, "items", RowData::new())?;
            *seen = Some(guard.id());
            Err(StoreError::NoTransaction)
        }

        let store = store();
        let mut seen = None;
        assert!(body(&store, &mut seen).is_err());
        assert!(store.get_row(seen.unwrap()).is_err());
    }

    #[test]
    fn test_temp_row_deleted_on_panic() {
        let store = store();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = temp_row(&store, "items", RowData::new()).unwrap();
            panic!("interrupted");
        }));
        assert!(result.is_err());
        assert!(store.search("items").unwrap().is_empty());
    }

    #[test]
    fn test_temp_row_tolerates_manual_delete() {
        let store = store();
        {
            let guard = temp_row(&store, "items", RowData::new()).unwrap();
            guard.delete().unwrap();
        }
        assert!(store.search("items").unwrap().is_empty());
    }

    #[test]
    fn test_temp_writes_discarded() {
        let store = store();
        let existing = store.add_row("items", RowData::new()).unwrap();
        let added = {
            let _writes = temp_writes(&store).unwrap();
            store.update_row(existing, "count", json!(5)).unwrap();
            store.add_row("items", RowData::new()).unwrap()
        };
        assert!(!store.in_transaction());
        assert_eq!(store.get_row(existing).unwrap()["count"], Value::Null);
        assert_eq!(store.get_row(added), Err(StoreError::RowDeleted(added)));
    }

    #[test]
    fn test_temp_writes_nested_fails() {
        let store = store();
        let _outer = temp_writes(&store).unwrap();
        assert!(matches!(temp_writes(&store), Err(StoreError::TransactionActive)));
    }
}
