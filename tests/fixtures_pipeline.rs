use std::sync::Arc;

use autotest::fixtures::{
    Column, Datastore, MemoryStore, RowData, StoreError, raises, temp_row, temp_writes, verify_table,
};
use autotest::{Config, Failure, Namespace, TestGroup, TestOutcome, ensure, ensure_eq};
use serde_json::json;

fn people_store() -> MemoryStore {
    MemoryStore::new().with_table(
        "people",
        vec![Column::new("name", "string"), Column::new("age", "number")],
    )
}

struct People {
    store: MemoryStore,
}

fn people() -> Result<People, Failure> {
    Ok(People { store: people_store() })
}

fn test_shape(p: &mut People) -> TestOutcome {
    verify_table(&p.store, "people", &[Column::new("name", "string")])?;
    Ok(())
}

fn test_wrong_shape(p: &mut People) -> TestOutcome {
    verify_table(
        &p.store,
        "people",
        &[Column::new("name", "number"), Column::new("email", "string")],
    )?;
    Ok(())
}

fn test_missing_table(p: &mut People) -> TestOutcome {
    verify_table(&p.store, "pets", &[])?;
    Ok(())
}

fn test_temp_row_cleanup(p: &mut People) -> TestOutcome {
    let before = p.store.search("people")?.len();
    let row = {
        let guard = temp_row(&p.store, "people", RowData::from([("name".to_string(), json!("ada"))]))?;
        ensure_eq!(guard.get("name")?, json!("ada"));
        guard.row()
    };
    ensure_eq!(p.store.search("people")?.len(), before);
    raises::<StoreError, _>(|| {
        row.get_id()?;
        Ok(())
    })
}

fn test_temp_writes_rollback(p: &mut People) -> TestOutcome {
    {
        let _writes = temp_writes(&p.store)?;
        p.store.add_row("people", RowData::new())?;
    }
    ensure!(p.store.search("people")?.is_empty(), "writes were kept");
    Ok(())
}

fn test_store_error_escapes(p: &mut People) -> TestOutcome {
    p.store.list_columns("pets")?;
    Ok(())
}

fn suite() -> Namespace {
    Namespace::new("app.tests").namespace(
        Namespace::new("app.tests.db").group(
            TestGroup::new("TestPeople", people)
                .method("test_shape", test_shape)
                .method("test_wrong_shape", test_wrong_shape)
                .method("test_missing_table", test_missing_table)
                .method("test_temp_row_cleanup", test_temp_row_cleanup)
                .method("test_temp_writes_rollback", test_temp_writes_rollback)
                .method("test_store_error_escapes", test_store_error_escapes),
        ),
    )
}

#[test]
fn test_fixture_suite_report() {
    let runner = autotest::builder().with_config(Config::default()).build().unwrap();
    let report = runner.run_with(&suite(), Some(false), Some("People"));

    assert!(report.contains("  Pass: db::TestPeople::test_shape\n"));
    assert!(report.contains(
        "> Fail: db::TestPeople::test_wrong_shape\n\
         >         column 'name' must be of type 'number' not 'string'\n\
         >         column 'email' not found"
    ));
    assert!(report.contains("> Fail: db::TestPeople::test_missing_table\n>         Table 'pets' not found."));
    assert!(report.contains("  Pass: db::TestPeople::test_temp_row_cleanup\n"));
    assert!(report.contains("  Pass: db::TestPeople::test_temp_writes_rollback\n"));
    assert!(report.contains(
        "> Fail: db::TestPeople::test_store_error_escapes\n\
         >         Error during test: StoreError: table 'pets' not found"
    ));
    assert!(report.contains("3/6 passed\n3 failed tests"));
}

#[test]
fn test_shared_store_across_threads() {
    let store = Arc::new(people_store());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                let _row = temp_row(store.as_ref(), "people", RowData::from([("age".to_string(), json!(i))]))
                    .unwrap();
                store.search("people").unwrap().len()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap() >= 1);
    }
    assert!(store.search("people").unwrap().is_empty());
}
