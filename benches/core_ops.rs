//! Core operator benchmarks: scan vs indexed selection, clustered insert,
//! and the two join variants.

use basalt::engine::Session;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn lcg(state: &mut u64) -> usize {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    (*state >> 33) as usize
}

fn session_with_column(index_clause: &str, rows: usize) -> Session {
    let mut state = 0xbe9c_u64;
    let mut s = Session::new();
    s.run("create(db,\"bench\")").unwrap();
    s.run("create(tbl,\"t\",bench,1)").unwrap();
    s.run(&format!("create(col,\"a\",bench.t{})", index_clause))
        .unwrap();
    for _ in 0..rows {
        s.run(&format!(
            "relational_insert(bench.t,{})",
            lcg(&mut state) % 100_000
        ))
        .unwrap();
    }
    s
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");
    let mut scan = session_with_column("", 100_000);
    group.bench_function("scan", |b| {
        b.iter(|| {
            scan.run(black_box("p=select(bench.t.a,40000,41000)"))
                .unwrap()
        })
    });

    let mut btree = session_with_column(",btree,unclustered", 100_000);
    group.bench_function("btree", |b| {
        b.iter(|| {
            btree
                .run(black_box("p=select(bench.t.a,40000,41000)"))
                .unwrap()
        })
    });

    let mut sorted = session_with_column(",sorted,unclustered", 100_000);
    group.bench_function("sorted", |b| {
        b.iter(|| {
            sorted
                .run(black_box("p=select(bench.t.a,40000,41000)"))
                .unwrap()
        })
    });
    group.finish();
}

fn bench_clustered_insert(c: &mut Criterion) {
    c.bench_function("clustered_insert_1k", |b| {
        b.iter(|| {
            let mut s = Session::new();
            s.run("create(db,\"bench\")").unwrap();
            s.run("create(tbl,\"t\",bench,1)").unwrap();
            s.run("create(col,\"a\",bench.t,btree,clustered)").unwrap();
            let mut state = 0x15e_u64;
            for _ in 0..1000 {
                s.run(&format!(
                    "relational_insert(bench.t,{})",
                    lcg(&mut state) % 10_000
                ))
                .unwrap();
            }
            black_box(s)
        })
    });
}

fn bench_joins(c: &mut Criterion) {
    let mut s = session_with_column("", 0);
    s.run("create(tbl,\"t2\",bench,1)").unwrap();
    s.run("create(col,\"a\",bench.t2)").unwrap();
    let mut state = 0x701_u64;
    for _ in 0..4096 {
        s.run(&format!("relational_insert(bench.t,{})", lcg(&mut state) % 2000))
            .unwrap();
        s.run(&format!("relational_insert(bench.t2,{})", lcg(&mut state) % 2000))
            .unwrap();
    }
    s.run("p1=select(bench.t.a,null,null)").unwrap();
    s.run("v1=fetch(bench.t.a,p1)").unwrap();
    s.run("p2=select(bench.t2.a,null,null)").unwrap();
    s.run("v2=fetch(bench.t2.a,p2)").unwrap();

    let mut group = c.benchmark_group("join");
    group.sample_size(20);
    group.bench_function("hash", |b| {
        b.iter(|| s.run(black_box("j1,j2=join(v1,p1,v2,p2,hash)")).unwrap())
    });
    group.bench_function("nested_loop", |b| {
        b.iter(|| {
            s.run(black_box("j1,j2=join(v1,p1,v2,p2,nested-loop)"))
                .unwrap()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_select, bench_clustered_insert, bench_joins);
criterion_main!(benches);
