//! The crate's own fixture helpers, tested with the crate itself.
//!
//! [`suite`] returns a namespace that any runner (the CLI, the debug page,
//! or [`crate::run`]) can execute. Every group builds a freshly seeded
//! [`MemoryStore`], so tests never observe each other's writes.

use serde_json::{Value, json};

use crate::fixtures::{
    Column, Datastore, MemoryStore, Row, RowData, StoreError, gen_int, gen_str, raises, raises_with, temp_row,
    temp_writes, verify_column, verify_table,
};
use crate::harness::{Failure, TestOutcome};
use crate::registry::{Namespace, TestGroup};
use crate::{ensure, ensure_eq};

/// Dotted path of the suite root.
pub const ROOT: &str = "autotest.selftest";

/// Table every store-backed group is seeded with.
pub const TEST_TABLE: &str = "test_table";

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct ValueError(&'static str);

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct LookupError(&'static str);

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Interrupted(&'static str);

/// Build the self-test suite.
pub fn suite() -> Namespace {
    Namespace::new(ROOT).namespace(
        Namespace::new(format!("{ROOT}.helpers"))
            .group(
                TestGroup::<()>::with_default("TestGenInt")
                    .method("test_int", gen_int_default)
                    .method("test_int_n", gen_int_bounded),
            )
            .group(
                TestGroup::<()>::with_default("TestGenStr")
                    .method("test_str", gen_str_default)
                    .method("test_str_n", gen_str_exact),
            )
            .group(
                TestGroup::new("TestVerifyColumn", Tables::new)
                    .method("test_good_column", good_column)
                    .method("test_bad_type_column", bad_type_column)
                    .method("test_bad_name_column", bad_name_column),
            )
            .group(
                TestGroup::new("TestVerifyTable", Tables::new)
                    .method("test_good_table", good_table)
                    .method("test_bad_table_name", bad_table_name)
                    .method("test_bad_table_column_name", bad_table_column_name)
                    .method("test_bad_table_column_type", bad_table_column_type),
            )
            .group(
                TestGroup::new("TestTempRow", Tables::new)
                    .method("test_row_instance", row_instance)
                    .method("test_row_deleted_normal", row_deleted_normal)
                    .method("test_row_deleted_with_exception", row_deleted_with_exception)
                    .method("test_empty_row", empty_row)
                    .method("test_populated_row", populated_row)
                    .method("test_with_existing_rows", with_existing_rows)
                    .method("test_deleted", deleted_inside_scope),
            )
            .group(
                TestGroup::new("TestTempWrites", Tables::new)
                    .method("test_new_row", writes_new_row)
                    .method("test_existing_row", writes_existing_row)
                    .method("test_exit_on_exception", writes_exit_on_error),
            )
            .group(
                TestGroup::<()>::with_default("TestRaises")
                    .method("test_expected", raises_expected)
                    .method("test_unexpected", raises_unexpected)
                    .method("test_no_exception", raises_nothing)
                    .method("test_custom_msg", raises_custom_msg),
            ),
    )
}

/// Group state: a seeded store and its expected shape.
struct Tables {
    store: MemoryStore,
    columns: Vec<Column>,
}

impl Tables {
    fn new() -> Result<Self, Failure> {
        let columns = vec![
            Column::new("text_col", "string"),
            Column::new("number_col", "number"),
            Column::new("bool_col", "bool"),
        ];
        let store = MemoryStore::new().with_table(TEST_TABLE, columns.clone());
        store.add_row(
            TEST_TABLE,
            fields([
                ("text_col", json!("existing_row")),
                ("number_col", json!(1)),
                ("bool_col", json!(false)),
            ]),
        )?;
        Ok(Self { store, columns })
    }

    fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    fn existing_row(&self) -> Result<Row<'_>, Failure> {
        let id = self
            .store
            .find_row(TEST_TABLE, "text_col", &json!("existing_row"))?
            .ok_or_else(|| Failure::message("seeded row 'existing_row' is missing"))?;
        Ok(Row::new(&self.store, id))
    }
}

fn fields<const N: usize>(pairs: [(&str, Value); N]) -> RowData {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn expect_deleted(row: Row<'_>) -> TestOutcome {
    raises::<StoreError, _>(|| {
        row.get_id()?;
        Ok(())
    })
}

// --- gen_int / gen_str ---

fn gen_int_default(_: &mut ()) -> TestOutcome {
    let i = gen_int(10);
    ensure!(i < 9_999_999_999, "expected at most 10 digits, got {i}");
    Ok(())
}

fn gen_int_bounded(_: &mut ()) -> TestOutcome {
    let n = 5;
    let i = gen_int(n);
    ensure!(
        i.to_string().len() <= n as usize,
        "Int has more digits than expected: n={n} -> i={i}"
    );
    Ok(())
}

fn gen_str_default(_: &mut ()) -> TestOutcome {
    let s = gen_str(10);
    ensure!(
        s.chars().all(|c| c.is_ascii_hexdigit()),
        "expected hex characters, got {s:?}"
    );
    Ok(())
}

fn gen_str_exact(_: &mut ()) -> TestOutcome {
    let n = 5;
    let s = gen_str(n);
    ensure!(s.len() == n, "Incorrect character count: n={n} -> s={s:?}");
    Ok(())
}

// --- verify_column ---

fn good_column(t: &mut Tables) -> TestOutcome {
    let result = verify_column(&t.store.list_columns(TEST_TABLE)?, "text_col", "string");
    ensure!(result.is_none(), "This is a valid column but got error: {result:?}");
    Ok(())
}

fn bad_type_column(t: &mut Tables) -> TestOutcome {
    let result = verify_column(&t.store.list_columns(TEST_TABLE)?, "text_col", "number").unwrap_or_default();
    ensure!(
        result.contains("type") && result.contains("string") && result.contains("number"),
        "Should get a type error: {result}"
    );
    Ok(())
}

fn bad_name_column(t: &mut Tables) -> TestOutcome {
    let result =
        verify_column(&t.store.list_columns(TEST_TABLE)?, "non_existant_column", "string").unwrap_or_default();
    ensure!(
        result.contains("not found") && result.contains("non_existant_column"),
        "Should get a not found error: {result}"
    );
    Ok(())
}

// --- verify_table ---

fn good_table(t: &mut Tables) -> TestOutcome {
    let result = verify_table(&t.store, TEST_TABLE, &t.columns);
    ensure!(result.is_ok(), "Should not get errors: {result:?}");
    Ok(())
}

fn bad_table_name(t: &mut Tables) -> TestOutcome {
    let result = verify_table(&t.store, "bad_table_name", &t.columns)
        .err()
        .map(|e| e.to_string())
        .unwrap_or_default();
    ensure!(
        result.contains("not found") && result.contains("bad_table_name"),
        "Should get a table not found error: {result}"
    );
    Ok(())
}

fn bad_table_column_name(t: &mut Tables) -> TestOutcome {
    let bad_columns = [Column::new("non_existant_row", "string")];
    let result = verify_table(&t.store, TEST_TABLE, &bad_columns)
        .err()
        .map(|e| e.to_string())
        .unwrap_or_default();
    ensure!(
        result.contains("not found") && result.contains("non_existant_row"),
        "Should get a column not found error: {result}"
    );
    Ok(())
}

fn bad_table_column_type(t: &mut Tables) -> TestOutcome {
    let mut bad_column = t.columns[0].clone();
    bad_column.column_type = "bad_type".to_string();
    let result = verify_table(&t.store, TEST_TABLE, &[bad_column])
        .err()
        .map(|e| e.to_string())
        .unwrap_or_default();
    ensure!(
        result.contains("type") && result.contains("bad_type"),
        "Should get a column type error: {result}"
    );
    Ok(())
}

// --- temp_row ---

fn row_instance(t: &mut Tables) -> TestOutcome {
    let row = temp_row(&t.store, TEST_TABLE, RowData::new())?;
    let id = row.get_id()?.to_string();
    ensure!(
        id.contains('[') && id.contains(',') && id.contains(']'),
        "Didn't get an expected row id: {id}"
    );
    Ok(())
}

fn row_deleted_normal(t: &mut Tables) -> TestOutcome {
    let row = {
        let guard = temp_row(&t.store, TEST_TABLE, RowData::new())?;
        guard.get_id()?;
        guard.row()
    };
    expect_deleted(row)
}

fn row_deleted_with_exception(t: &mut Tables) -> TestOutcome {
    let mut seen = None;
    raises::<Interrupted, _>(|| {
        let guard = temp_row(&t.store, TEST_TABLE, RowData::new())?;
        seen = Some(guard.row());
        guard.get_id()?;
        Err(Interrupted("Testing the error does not keep the row alive").into())
    })?;

    let row = seen.ok_or_else(|| Failure::message("row was never created"))?;
    expect_deleted(row)
}

fn empty_row(t: &mut Tables) -> TestOutcome {
    let row = {
        let guard = temp_row(&t.store, TEST_TABLE, RowData::new())?;
        let data = guard.data()?;
        for column in t.column_names() {
            let value = data
                .get(column)
                .ok_or_else(|| Failure::message(format!("row should have column: '{column}'")))?;
            ensure!(value.is_null(), "row[{column}] should be null");
        }
        guard.row()
    };
    expect_deleted(row)
}

fn populated_row(t: &mut Tables) -> TestOutcome {
    let expected = fields([
        ("text_col", json!(gen_str(10))),
        ("number_col", json!(gen_int(10))),
        ("bool_col", json!(true)),
    ]);
    let row = temp_row(&t.store, TEST_TABLE, expected.clone())?;
    for column in t.column_names() {
        let actual = row.get(column)?;
        ensure_eq!(actual, expected[column], "row[{column}] mismatch");
    }
    Ok(())
}

fn with_existing_rows(t: &mut Tables) -> TestOutcome {
    let table_count = t.store.search(TEST_TABLE)?.len();
    let existing = temp_row(&t.store, TEST_TABLE, fields([("text_col", json!("row_a"))]))?;
    let frozen = existing.data()?;

    let new_row = temp_row(&t.store, TEST_TABLE, fields([("text_col", json!("row_b"))]))?;
    let rows = t.store.search(TEST_TABLE)?;
    ensure!(
        rows.len() == 2 + table_count,
        "Expected to have {} rows",
        2 + table_count
    );
    new_row.set("bool_col", true)?;
    ensure!(existing.data()? == frozen, "existing row somehow changed!");
    Ok(())
}

fn deleted_inside_scope(t: &mut Tables) -> TestOutcome {
    let row = temp_row(&t.store, TEST_TABLE, fields([("text_col", json!(gen_str(10)))]))?;
    if let Err(e) = row.delete() {
        return Err(Failure::message(format!("Error after deleting row within block: {e}")));
    }
    Ok(())
}

// --- temp_writes ---

fn writes_new_row(t: &mut Tables) -> TestOutcome {
    let new_row = {
        let _writes = temp_writes(&t.store)?;
        let id = t.store.add_row(TEST_TABLE, fields([("text_col", json!(gen_str(10)))]))?;
        let row = Row::new(&t.store, id);
        row.set("number_col", gen_int(10))?;
        row
    };
    expect_deleted(new_row)
}

/// Change the seeded row and add a new one inside a transaction, optionally
/// bailing out with an error, then check that nothing stuck.
fn check_writes_discarded(t: &mut Tables, bail: bool) -> TestOutcome {
    let existing = t.existing_row()?;
    let previous = existing.data()?;

    let mut new_row = None;
    let outcome = (|| -> TestOutcome {
        let _writes = temp_writes(&t.store)?;
        let id = t.store.add_row(TEST_TABLE, fields([("number_col", json!(gen_int(10)))]))?;
        let row = Row::new(&t.store, id);
        new_row = Some(row);
        row.set("bool_col", false)?;

        let flipped = !existing.get("bool_col")?.as_bool().unwrap_or_default();
        existing.set("bool_col", flipped)?;
        existing.set("number_col", gen_int(10))?;

        if bail {
            return Err(Interrupted("timed out").into());
        }
        Ok(())
    })();

    match outcome {
        Ok(()) => {}
        Err(failure) if failure.downcast_ref::<Interrupted>().is_some() => {}
        Err(failure) => return Err(failure),
    }

    let new_row = new_row.ok_or_else(|| Failure::message("row was never created"))?;
    expect_deleted(new_row)?;

    let existing = t.existing_row()?;
    ensure_eq!(
        existing.get("bool_col")?,
        previous["bool_col"],
        "Row should not have been updated with a value"
    );
    ensure_eq!(
        existing.get("number_col")?,
        previous["number_col"],
        "Row should not have been updated with a value"
    );
    Ok(())
}

fn writes_existing_row(t: &mut Tables) -> TestOutcome {
    check_writes_discarded(t, false)
}

fn writes_exit_on_error(t: &mut Tables) -> TestOutcome {
    check_writes_discarded(t, true)
}

// --- raises ---

fn raises_expected(_: &mut ()) -> TestOutcome {
    let outcome = raises::<ValueError, _>(|| Err(ValueError("Just a test error").into()));
    if let Err(e) = outcome {
        return Err(Failure::message(format!("Should not be raising an assertion: {e}")));
    }
    Ok(())
}

fn raises_unexpected(_: &mut ()) -> TestOutcome {
    match raises::<LookupError, _>(|| Err(ValueError("Just a test error").into())) {
        Ok(()) => Err(Failure::message("ValueError was incorrectly captured")),
        Err(e) => {
            let e = e.to_string();
            ensure!(e.contains("ValueError raised"), "Wrong assertion error: {e}");
            ensure!(e.contains("expected LookupError"), "Wrong assertion error: {e}");
            Ok(())
        }
    }
}

fn raises_nothing(_: &mut ()) -> TestOutcome {
    match raises::<LookupError, _>(|| Ok(())) {
        Ok(()) => Err(Failure::message("LookupError was reported without being raised")),
        Err(e) => {
            let e = e.to_string();
            ensure!(
                e.contains("LookupError not raised"),
                "Expected to get a not raised assertion: {e}"
            );
            Ok(())
        }
    }
}

fn raises_custom_msg(_: &mut ()) -> TestOutcome {
    let msg = gen_str(10);
    match raises_with::<LookupError, _>(msg.clone(), || Ok(())) {
        Ok(()) => Err(Failure::message("LookupError was reported without being raised")),
        Err(e) => {
            ensure_eq!(e.to_string(), msg, "Did not get expected msg");
            Ok(())
        }
    }
}
