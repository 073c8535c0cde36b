use crate::engine::Session;
use crate::persist;

fn populated_session() -> Session {
    let mut s = Session::new();
    s.run("create(db,\"db1\")").unwrap();
    s.run("create(tbl,\"tbl1\",db1,2)").unwrap();
    s.run("create(col,\"a\",db1.tbl1,btree,clustered)").unwrap();
    s.run("create(col,\"b\",db1.tbl1,sorted,unclustered)").unwrap();
    for (a, b) in [(30, 3), (10, 1), (20, 2), (40, 4)] {
        s.run(&format!("relational_insert(db1.tbl1,{},{})", a, b))
            .unwrap();
    }
    s
}

#[test]
fn save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let original = populated_session();
    persist::save(&original.catalog, dir.path()).unwrap();

    let restored = persist::load(dir.path()).unwrap().unwrap();
    let mut restored = Session::from_catalog(restored);

    // same rows, same index behaviour
    restored.run("p=select(db1.tbl1.a,15,35)").unwrap();
    restored.run("v=fetch(db1.tbl1.b,p)").unwrap();
    let values = restored
        .context
        .result("v")
        .unwrap()
        .as_int32()
        .unwrap()
        .to_vec();
    assert_eq!(values, vec![2, 3]);

    let tbl = &restored.catalog.dbs[0].tables[0];
    assert_eq!(tbl.columns[0].data, vec![10, 20, 30, 40]);
    assert_eq!(tbl.primary, Some(0));
    match &tbl.columns[0].index {
        Some(crate::catalog::ColumnIndex::BTree(tree)) => {
            assert!(tree.is_clustered());
            tree.check_invariants(Some(&tbl.columns[0].data)).unwrap();
        }
        other => panic!("unexpected index {:?}", other),
    }

    // inserts keep working against the reloaded index
    restored.run("relational_insert(db1.tbl1,15,9)").unwrap();
    let tbl = &restored.catalog.dbs[0].tables[0];
    assert_eq!(tbl.columns[0].data, vec![10, 15, 20, 30, 40]);
}

#[test]
fn missing_catalog_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(persist::load(dir.path()).unwrap().is_none());
}

#[test]
fn corrupted_catalog_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let s = populated_session();
    persist::save(&s.catalog, dir.path()).unwrap();

    let path = dir.path().join("database.bin");
    let mut bytes = std::fs::read(&path).unwrap();
    bytes[0] ^= 0xff;
    std::fs::write(&path, bytes).unwrap();

    assert!(matches!(
        persist::load(dir.path()),
        Err(crate::error::BasaltError::IncorrectFileFormat { .. })
    ));
}

#[test]
fn data_dir_lock_is_exclusive() {
    let dir = tempfile::tempdir().unwrap();
    let held = persist::lock_data_dir(dir.path()).unwrap();
    assert!(persist::lock_data_dir(dir.path()).is_err());
    drop(held);
    assert!(persist::lock_data_dir(dir.path()).is_ok());
}

#[test]
fn csv_loader_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("rows.csv");
    std::fs::write(
        &csv_path,
        "db1.tbl1.a,db1.tbl1.b\n30,3\n10,1\n20,2\n",
    )
    .unwrap();

    let mut s = Session::new();
    s.run("create(db,\"db1\")").unwrap();
    s.run("create(tbl,\"tbl1\",db1,2)").unwrap();
    s.run("create(col,\"a\",db1.tbl1,btree,clustered)").unwrap();
    s.run("create(col,\"b\",db1.tbl1)").unwrap();

    let loaded = persist::loader::load_csv(
        &mut s.catalog,
        csv_path.to_str().unwrap(),
    )
    .unwrap();
    assert_eq!(loaded, 3);

    // loader routes through the insert coordinator: clustered order holds
    let tbl = &s.catalog.dbs[0].tables[0];
    assert_eq!(tbl.columns[0].data, vec![10, 20, 30]);
    assert_eq!(tbl.columns[1].data, vec![1, 2, 3]);
}

#[test]
fn csv_loader_error_paths() {
    let mut s = Session::new();
    s.run("create(db,\"db1\")").unwrap();
    s.run("create(tbl,\"tbl1\",db1,1)").unwrap();
    s.run("create(col,\"a\",db1.tbl1)").unwrap();

    assert!(matches!(
        persist::loader::load_csv(&mut s.catalog, "/nonexistent/rows.csv"),
        Err(crate::error::BasaltError::FileNotFound { .. })
    ));

    let dir = tempfile::tempdir().unwrap();
    let bad_header = dir.path().join("bad_header.csv");
    std::fs::write(&bad_header, "not_a_qualified_name\n1\n").unwrap();
    assert!(matches!(
        persist::loader::load_csv(&mut s.catalog, bad_header.to_str().unwrap()),
        Err(crate::error::BasaltError::IncorrectFileFormat { .. })
    ));

    let bad_row = dir.path().join("bad_row.csv");
    std::fs::write(&bad_row, "db1.tbl1.a\nten\n").unwrap();
    assert!(matches!(
        persist::loader::load_csv(&mut s.catalog, bad_row.to_str().unwrap()),
        Err(crate::error::BasaltError::IncorrectFileFormat { .. })
    ));
}
