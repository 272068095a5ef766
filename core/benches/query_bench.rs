use bquery_core::query::answer;
use bquery_core::{Document, InvertedIndex};
use criterion::{criterion_group, criterion_main, Criterion};

fn synthetic_index() -> InvertedIndex {
    let mut idx = InvertedIndex::new();
    for id in 1..=20_000u32 {
        let text = format!("t{} t{} t{} common", id % 7, id % 13, id % 101);
        idx.add_document(&Document { id, name: format!("DOC-{id}"), text });
    }
    idx
}

fn bench_queries(c: &mut Criterion) {
    let idx = synthetic_index();
    c.bench_function("and_or_not", |b| {
        b.iter(|| answer(&idx, "( ( t1 OR t2 ) AND t5 ) NOT ( t17 OR common )"))
    });
    c.bench_function("wide_union", |b| b.iter(|| answer(&idx, "common OR t3")));
}

criterion_group!(benches, bench_queries);
criterion_main!(benches);
