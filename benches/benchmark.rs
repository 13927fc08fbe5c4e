use criterion::{Criterion, black_box, criterion_group, criterion_main};

use tripod::construct::{Bindings, MatchScratch, Triple};
use tripod::persist::{FactStore, PersistenceMode, SqliteStore};
use tripod::query::parse_clauses;

pub fn criterion_benchmark(c: &mut Criterion) {
    let pattern = Triple::new("?person", "likes", "?what").unwrap();
    let fact = Triple::new("alice", "likes", "cake").unwrap();
    let mut scratch = MatchScratch::new();
    c.bench_function("match", |b| {
        b.iter(|| pattern.matches_fact_with(black_box(&fact), &mut scratch))
    });
    let empty = Bindings::new();
    c.bench_function("derive", |b| {
        b.iter(|| pattern.derive_bindings(black_box(&fact), &empty))
    });
    let bindings = pattern.derive_bindings(&fact, &empty).unwrap();
    c.bench_function("substitute", |b| {
        b.iter(|| pattern.substitute(black_box(&bindings)))
    });

    let store = SqliteStore::new(PersistenceMode::InMemory).unwrap();
    for n in 0..1000u32 {
        let follows = Triple::new(
            &format!("thing{n}"),
            "follows",
            &format!("thing{}", (n + 1) % 1000),
        )
        .unwrap();
        store.insert(&follows).unwrap();
    }
    let single = parse_clauses("?a follows ?b").unwrap();
    c.bench_function("enumerate 1k", |b| {
        b.iter(|| store.enumerate(black_box(&single)).unwrap())
    });
    let chained = parse_clauses("?a follows ?b . ?b follows ?c").unwrap();
    c.bench_function("enumerate 1k join", |b| {
        b.iter(|| store.enumerate(black_box(&chained)).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
