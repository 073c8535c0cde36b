use crate::catalog::{Catalog, Clustering, ColumnRef, IndexKind, IndexSpec, TableRef};
use crate::error::BasaltError;

fn tref() -> TableRef {
    TableRef {
        db: "db1".to_string(),
        table: "tbl1".to_string(),
    }
}

fn cref(name: &str) -> ColumnRef {
    ColumnRef {
        db: "db1".to_string(),
        table: "tbl1".to_string(),
        column: name.to_string(),
    }
}

fn small_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.create_db("db1").unwrap();
    catalog.create_table("db1", "tbl1", 2).unwrap();
    catalog.create_column(&tref(), "a", None).unwrap();
    catalog.create_column(&tref(), "b", None).unwrap();
    catalog
}

#[test]
fn duplicate_names_are_rejected() {
    let mut catalog = small_catalog();
    assert!(matches!(
        catalog.create_db("db1"),
        Err(BasaltError::ObjectAlreadyExists { .. })
    ));
    assert!(matches!(
        catalog.create_table("db1", "tbl1", 1),
        Err(BasaltError::ObjectAlreadyExists { .. })
    ));
    assert!(matches!(
        catalog.create_column(&tref(), "a", None),
        Err(BasaltError::ObjectAlreadyExists { .. })
    ));
}

#[test]
fn only_current_db_is_addressable() {
    let mut catalog = small_catalog();
    catalog.create_db("db2").unwrap();
    // db2 is now current; db1 lookups fail
    assert!(matches!(
        catalog.table(&tref()),
        Err(BasaltError::ObjectNotFound { .. })
    ));
}

#[test]
fn column_slots_are_bounded_by_declaration() {
    let mut catalog = small_catalog();
    assert!(matches!(
        catalog.create_column(&tref(), "c", None),
        Err(BasaltError::ExecutionError { .. })
    ));
}

#[test]
fn create_index_over_existing_data() {
    let mut catalog = small_catalog();
    {
        let tbl = catalog.table_mut(&tref()).unwrap();
        tbl.columns[0].data = vec![5, 1, 3];
        tbl.columns[1].data = vec![50, 10, 30];
        tbl.row_count = 3;
    }
    catalog
        .create_index(
            &cref("a"),
            IndexSpec {
                kind: IndexKind::BTree,
                clustering: Clustering::Unclustered,
            },
        )
        .unwrap();
    let col = catalog.column(&cref("a")).unwrap();
    assert!(col.index.as_ref().unwrap().kind() == IndexKind::BTree);
    assert!(!col.index.as_ref().unwrap().is_clustered());

    // second index on the same column is rejected
    assert!(matches!(
        catalog.create_index(
            &cref("a"),
            IndexSpec {
                kind: IndexKind::Sorted,
                clustering: Clustering::Unclustered,
            },
        ),
        Err(BasaltError::IndexAlreadyExists { .. })
    ));
}

#[test]
fn clustered_index_requires_sorted_base() {
    let mut catalog = small_catalog();
    {
        let tbl = catalog.table_mut(&tref()).unwrap();
        tbl.columns[0].data = vec![5, 1, 3];
        tbl.row_count = 3;
    }
    assert!(matches!(
        catalog.create_index(
            &cref("a"),
            IndexSpec {
                kind: IndexKind::Sorted,
                clustering: Clustering::Clustered,
            },
        ),
        Err(BasaltError::ExecutionError { .. })
    ));
}

#[test]
fn one_primary_per_table() {
    let mut catalog = small_catalog();
    let spec = IndexSpec {
        kind: IndexKind::BTree,
        clustering: Clustering::Clustered,
    };
    catalog.create_index(&cref("a"), spec).unwrap();
    assert_eq!(catalog.table(&tref()).unwrap().primary, Some(0));
    assert!(matches!(
        catalog.create_index(&cref("b"), spec),
        Err(BasaltError::QueryUnsupported { .. })
    ));
}
