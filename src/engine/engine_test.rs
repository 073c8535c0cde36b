use crate::context::{ResultColumn, ResultPayload};
use crate::engine::{Response, Session};
use crate::error::BasaltError;

fn lcg(state: &mut u64) -> usize {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    (*state >> 33) as usize
}

/// db1.tbl1 with columns a and b, no indexes.
fn session_with_rows(rows: &[(i32, i32)]) -> Session {
    let mut s = Session::new();
    s.run("create(db,\"db1\")").unwrap();
    s.run("create(tbl,\"tbl1\",db1,2)").unwrap();
    s.run("create(col,\"a\",db1.tbl1)").unwrap();
    s.run("create(col,\"b\",db1.tbl1)").unwrap();
    for (a, b) in rows {
        s.run(&format!("relational_insert(db1.tbl1,{},{})", a, b))
            .unwrap();
    }
    s
}

fn positions(s: &Session, handle: &str) -> Vec<usize> {
    s.context
        .result(handle)
        .unwrap()
        .as_positions()
        .unwrap()
        .to_vec()
}

#[test]
fn select_fetch_sum_pipeline() {
    let mut s = session_with_rows(&[(10, 100), (20, 200), (30, 300)]);
    s.run("p=select(db1.tbl1.a,15,30)").unwrap();
    assert_eq!(positions(&s, "p"), vec![1]);
    s.run("v=fetch(db1.tbl1.b,p)").unwrap();
    s.run("sm=sum(v)").unwrap();
    match &s.context.result("sm").unwrap().payload {
        ResultPayload::Int64(v) => assert_eq!(v, &vec![200]),
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn null_bounds_are_open() {
    let mut s = session_with_rows(&[(i32::MIN, 0), (0, 1), (i32::MAX, 2)]);
    s.run("p=select(db1.tbl1.a,null,null)").unwrap();
    assert_eq!(positions(&s, "p"), vec![0, 1, 2]);
    s.run("q=select(db1.tbl1.a,0,null)").unwrap();
    assert_eq!(positions(&s, "q"), vec![1, 2]);
}

#[test]
fn filtered_select_restricts_prior_fetch() {
    let mut s = session_with_rows(&[(10, 5), (20, 6), (30, 7), (40, 8)]);
    s.run("p=select(db1.tbl1.a,15,null)").unwrap(); // rows 1..=3
    s.run("v=fetch(db1.tbl1.b,p)").unwrap(); // [6, 7, 8]
    s.run("q=select(p,v,7,null)").unwrap(); // keep v >= 7
    assert_eq!(positions(&s, "q"), vec![2, 3]);
}

#[test]
fn select_equivalence_across_indexes() {
    let mut state = 0xabc_u64;
    let rows: Vec<i32> = (0..3000).map(|_| (lcg(&mut state) % 1000) as i32).collect();

    // four sessions: no index, sorted unclustered, btree unclustered,
    // btree clustered; identical data
    let mut plain = Session::new();
    plain.run("create(db,\"db1\")").unwrap();
    plain.run("create(tbl,\"tbl1\",db1,1)").unwrap();
    plain.run("create(col,\"a\",db1.tbl1)").unwrap();

    let mut sorted = Session::new();
    sorted.run("create(db,\"db1\")").unwrap();
    sorted.run("create(tbl,\"tbl1\",db1,1)").unwrap();
    sorted
        .run("create(col,\"a\",db1.tbl1,sorted,unclustered)")
        .unwrap();

    let mut btree = Session::new();
    btree.run("create(db,\"db1\")").unwrap();
    btree.run("create(tbl,\"tbl1\",db1,1)").unwrap();
    btree
        .run("create(col,\"a\",db1.tbl1,btree,unclustered)")
        .unwrap();

    let mut clustered = Session::new();
    clustered.run("create(db,\"db1\")").unwrap();
    clustered.run("create(tbl,\"tbl1\",db1,1)").unwrap();
    clustered
        .run("create(col,\"a\",db1.tbl1,btree,clustered)")
        .unwrap();

    for &v in &rows {
        let line = format!("relational_insert(db1.tbl1,{})", v);
        plain.run(&line).unwrap();
        sorted.run(&line).unwrap();
        btree.run(&line).unwrap();
        clustered.run(&line).unwrap();
    }

    for (lo, hi) in [(500i64, 600i64), (0, 1000), (990, 2000), (250, 250)] {
        let query = format!("p=select(db1.tbl1.a,{},{})", lo, hi);
        plain.run(&query).unwrap();
        sorted.run(&query).unwrap();
        btree.run(&query).unwrap();
        clustered.run(&query).unwrap();

        let mut expect = positions(&plain, "p");
        expect.sort_unstable();

        for (name, s) in [("sorted", &sorted), ("btree", &btree)] {
            let mut got = positions(s, "p");
            got.sort_unstable();
            assert_eq!(got, expect, "{} index, range [{}, {})", name, lo, hi);
        }

        // the clustered session reordered its base, so compare fetched
        // value multisets instead of positions
        let mut cl = clustered.clone_values("p");
        let mut pl = plain.clone_values_from_rows(&rows, &expect);
        cl.sort_unstable();
        pl.sort_unstable();
        assert_eq!(cl, pl, "clustered range [{}, {})", lo, hi);
    }
}

impl Session {
    /// Values of column a at the positions bound to `handle`.
    fn clone_values(&self, handle: &str) -> Vec<i32> {
        let tbl = &self.catalog.dbs[0].tables[0];
        self.context
            .result(handle)
            .unwrap()
            .as_positions()
            .unwrap()
            .iter()
            .map(|&p| tbl.columns[0].data[p])
            .collect()
    }

    fn clone_values_from_rows(&self, rows: &[i32], pos: &[usize]) -> Vec<i32> {
        pos.iter().map(|&p| rows[p]).collect()
    }
}

#[test]
fn shared_scan_matches_individual_selects() {
    let mut state = 0x51a_u64;
    let rows: Vec<(i32, i32)> = (0..500)
        .map(|_| ((lcg(&mut state) % 40) as i32, 0))
        .collect();
    let mut s = session_with_rows(&rows);

    // individual runs
    s.run("i1=select(db1.tbl1.a,0,10)").unwrap();
    s.run("i2=select(db1.tbl1.a,5,15)").unwrap();
    s.run("i3=select(db1.tbl1.a,20,30)").unwrap();

    // batched runs over the same column
    s.run("batch_queries()").unwrap();
    s.run("b1=select(db1.tbl1.a,0,10)").unwrap();
    s.run("b2=select(db1.tbl1.a,5,15)").unwrap();
    s.run("b3=select(db1.tbl1.a,20,30)").unwrap();
    s.run("batch_execute()").unwrap();

    for (individual, batched) in [("i1", "b1"), ("i2", "b2"), ("i3", "b3")] {
        assert_eq!(
            positions(&s, individual),
            positions(&s, batched),
            "{} vs {}",
            individual,
            batched
        );
    }
}

#[test]
fn batch_rejects_mixed_columns_and_filters() {
    let mut s = session_with_rows(&[(1, 2)]);
    s.run("p=select(db1.tbl1.a,null,null)").unwrap();
    s.run("v=fetch(db1.tbl1.b,p)").unwrap();

    s.run("batch_queries()").unwrap();
    s.run("b1=select(db1.tbl1.a,0,10)").unwrap();
    assert!(matches!(
        s.run("b2=select(db1.tbl1.b,0,10)"),
        Err(BasaltError::InvariantViolation { .. })
    ));
    assert!(matches!(
        s.run("b3=select(p,v,0,10)"),
        Err(BasaltError::InvariantViolation { .. })
    ));

    assert!(matches!(
        Session::new().run("batch_execute()"),
        Err(BasaltError::InvariantViolation { .. })
    ));
}

#[test]
fn clustered_insert_reorders_all_columns() {
    // a is the btree-clustered primary; b carries an unclustered sorted
    // index that must stay in lock-step through the reordering
    let mut s = Session::new();
    s.run("create(db,\"db1\")").unwrap();
    s.run("create(tbl,\"tbl1\",db1,2)").unwrap();
    s.run("create(col,\"a\",db1.tbl1,btree,clustered)").unwrap();
    s.run("create(col,\"b\",db1.tbl1,sorted,unclustered)").unwrap();

    for (a, b) in [(5, 50), (1, 10), (3, 30), (2, 20), (4, 40)] {
        s.run(&format!("relational_insert(db1.tbl1,{},{})", a, b))
            .unwrap();

        let tbl = &s.catalog.dbs[0].tables[0];
        let a_data = &tbl.columns[0].data;
        assert!(a_data.windows(2).all(|w| w[0] <= w[1]), "primary unsorted");

        // b's rows still pair with a's rows
        let b_data = &tbl.columns[1].data;
        for (av, bv) in a_data.iter().zip(b_data) {
            assert_eq!(*bv, av * 10, "row pairing broken");
        }
        match &tbl.columns[1].index {
            Some(crate::catalog::ColumnIndex::Sorted(idx)) => match idx {
                crate::index::SortedIndex::Unclustered { keys, positions } => {
                    for (k, p) in keys.iter().zip(positions) {
                        assert_eq!(b_data[*p], *k, "sorted index out of step");
                    }
                }
                _ => panic!("expected unclustered"),
            },
            other => panic!("unexpected index {:?}", other),
        }
    }

    let tbl = &s.catalog.dbs[0].tables[0];
    assert_eq!(tbl.columns[0].data, vec![1, 2, 3, 4, 5]);
    assert_eq!(tbl.columns[1].data, vec![10, 20, 30, 40, 50]);
    match &tbl.columns[0].index {
        Some(crate::catalog::ColumnIndex::BTree(tree)) => {
            tree.check_invariants(Some(&tbl.columns[0].data)).unwrap()
        }
        other => panic!("unexpected index {:?}", other),
    }
}

#[test]
fn aggregates_over_empty_inputs_are_empty() {
    let mut s = session_with_rows(&[(1, 1)]);
    s.run("p=select(db1.tbl1.a,100,200)").unwrap(); // no matches
    s.run("v=fetch(db1.tbl1.b,p)").unwrap();
    s.run("sm=sum(v)").unwrap();
    s.run("av=avg(v)").unwrap();
    assert_eq!(s.context.result("sm").unwrap().len(), 0);
    assert_eq!(s.context.result("av").unwrap().len(), 0);
}

#[test]
fn avg_is_exact_division() {
    let mut s = session_with_rows(&[(1, 10), (2, 11), (3, 14)]);
    s.run("p=select(db1.tbl1.a,null,null)").unwrap();
    s.run("v=fetch(db1.tbl1.b,p)").unwrap();
    s.run("av=avg(v)").unwrap();
    match &s.context.result("av").unwrap().payload {
        ResultPayload::Float64(v) => assert!((v[0] - 35.0 / 3.0).abs() < 1e-12),
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn scalar_min_max() {
    let mut s = session_with_rows(&[(4, 0), (-2, 0), (9, 0), (-2, 0)]);
    s.run("lo=min(db1.tbl1.a)").unwrap();
    s.run("hi=max(db1.tbl1.a)").unwrap();
    match &s.context.result("lo").unwrap().payload {
        ResultPayload::Int32(v) => assert_eq!(v, &vec![-2]),
        other => panic!("unexpected payload {:?}", other),
    }
    match &s.context.result("hi").unwrap().payload {
        ResultPayload::Int32(v) => assert_eq!(v, &vec![9]),
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn indexed_min_max_reports_all_ties() {
    let mut s = session_with_rows(&[(7, 0), (3, 0), (7, 0), (1, 0), (7, 0)]);
    s.run("p=select(db1.tbl1.a,null,null)").unwrap();
    s.run("v=fetch(db1.tbl1.a,p)").unwrap();
    s.run("mp,mv=max(p,v)").unwrap();
    assert_eq!(positions(&s, "mp"), vec![0, 2, 4]);
    match &s.context.result("mv").unwrap().payload {
        ResultPayload::Int32(v) => assert_eq!(v, &vec![7, 7, 7]),
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn indexed_min_max_sole_extremum_at_first_element() {
    // the extremum sits at index 0 and nowhere else; it must be reported
    // exactly once
    let mut s = session_with_rows(&[(1, 0), (5, 0), (9, 0)]);
    s.run("p=select(db1.tbl1.a,null,null)").unwrap();
    s.run("v=fetch(db1.tbl1.a,p)").unwrap();
    s.run("mp,mv=min(p,v)").unwrap();
    assert_eq!(positions(&s, "mp"), vec![0]);
    match &s.context.result("mv").unwrap().payload {
        ResultPayload::Int32(v) => assert_eq!(v, &vec![1]),
        other => panic!("unexpected payload {:?}", other),
    }

    // with null positions, element indexes stand in
    s.run("np,nv=min(null,v)").unwrap();
    assert_eq!(positions(&s, "np"), vec![0]);
}

#[test]
fn add_sub_promote_to_float() {
    let mut s = session_with_rows(&[(1, 10), (2, 20)]);
    s.run("p=select(db1.tbl1.a,null,null)").unwrap();
    s.run("v1=fetch(db1.tbl1.a,p)").unwrap();
    s.run("v2=fetch(db1.tbl1.b,p)").unwrap();

    s.run("total=add(v1,v2)").unwrap();
    match &s.context.result("total").unwrap().payload {
        ResultPayload::Int64(v) => assert_eq!(v, &vec![11, 22]),
        other => panic!("unexpected payload {:?}", other),
    }

    // avg produces a float; adding it to anything floats the output
    s.context
        .bind("f", ResultColumn::float64(vec![0.5, 1.5]))
        .unwrap();
    s.run("fs=add(v1,f)").unwrap();
    match &s.context.result("fs").unwrap().payload {
        ResultPayload::Float64(v) => assert_eq!(v, &vec![1.5, 3.5]),
        other => panic!("unexpected payload {:?}", other),
    }

    // mismatched lengths are rejected
    s.run("short=select(db1.tbl1.a,2,null)").unwrap();
    s.run("v3=fetch(db1.tbl1.a,short)").unwrap();
    assert!(matches!(
        s.run("bad=add(v1,v3)"),
        Err(BasaltError::QueryUnsupported { .. })
    ));
}

#[test]
fn hash_and_nested_loop_joins_agree() {
    let mut state = 0x701_u64;
    let left: Vec<(i32, i32)> = (0..700)
        .map(|_| ((lcg(&mut state) % 120) as i32, 0))
        .collect();
    let right: Vec<(i32, i32)> = (0..400)
        .map(|_| ((lcg(&mut state) % 120) as i32, 0))
        .collect();

    let mut s = Session::new();
    s.run("create(db,\"db1\")").unwrap();
    s.run("create(tbl,\"t1\",db1,1)").unwrap();
    s.run("create(col,\"a\",db1.t1)").unwrap();
    s.run("create(tbl,\"t2\",db1,1)").unwrap();
    s.run("create(col,\"a\",db1.t2)").unwrap();
    for (v, _) in &left {
        s.run(&format!("relational_insert(db1.t1,{})", v)).unwrap();
    }
    for (v, _) in &right {
        s.run(&format!("relational_insert(db1.t2,{})", v)).unwrap();
    }

    s.run("p1=select(db1.t1.a,null,null)").unwrap();
    s.run("v1=fetch(db1.t1.a,p1)").unwrap();
    s.run("p2=select(db1.t2.a,null,null)").unwrap();
    s.run("v2=fetch(db1.t2.a,p2)").unwrap();

    s.run("h1,h2=join(v1,p1,v2,p2,hash)").unwrap();
    s.run("n1,n2=join(v1,p1,v2,p2,nested-loop)").unwrap();

    let pair = |a: &str, b: &str, s: &Session| -> Vec<(usize, usize)> {
        let left = positions(s, a);
        let right = positions(s, b);
        assert_eq!(left.len(), right.len());
        let mut pairs: Vec<(usize, usize)> = left.into_iter().zip(right).collect();
        pairs.sort_unstable();
        pairs
    };
    let hash_pairs = pair("h1", "h2", &s);
    let loop_pairs = pair("n1", "n2", &s);
    assert_eq!(hash_pairs, loop_pairs);

    // cross-check against a naive join
    let mut naive = Vec::new();
    for (lp, (lv, _)) in left.iter().enumerate() {
        for (rp, (rv, _)) in right.iter().enumerate() {
            if lv == rv {
                naive.push((lp, rp));
            }
        }
    }
    naive.sort_unstable();
    assert_eq!(hash_pairs, naive);
}

#[test]
fn fetch_rejects_out_of_range_positions() {
    let mut s = session_with_rows(&[(1, 2)]);
    s.context
        .bind("bad", ResultColumn::positions(vec![5]))
        .unwrap();
    assert!(matches!(
        s.run("v=fetch(db1.tbl1.b,bad)"),
        Err(BasaltError::InvariantViolation { .. })
    ));
}

#[test]
fn print_multi_column_layout() {
    let mut s = session_with_rows(&[(1, 10), (2, 20), (3, 30)]);
    s.run("p=select(db1.tbl1.a,null,null)").unwrap();
    s.run("va=fetch(db1.tbl1.a,p)").unwrap();
    s.run("vb=fetch(db1.tbl1.b,p)").unwrap();
    match s.run("print(va,vb)").unwrap() {
        Response::Print(payload) => {
            assert_eq!(payload, "1,10\n2,20\n3,30\n");
        }
        other => panic!("unexpected response {:?}", other),
    }

    assert!(matches!(
        s.run("print(p,sm_missing)"),
        Err(BasaltError::ObjectNotFound { .. })
    ));
}

#[test]
fn unknown_objects_are_reported() {
    let mut s = session_with_rows(&[(1, 2)]);
    assert!(matches!(
        s.run("p=select(db1.tbl1.zzz,0,10)"),
        Err(BasaltError::ObjectNotFound { .. })
    ));
    assert!(matches!(
        s.run("p=select(db2.tbl1.a,0,10)"),
        Err(BasaltError::ObjectNotFound { .. })
    ));
}
