//! Explanation store benchmark: encrypted insert and read.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use salain::explain::{cache_key, CacheStore};
use salain::storage::SqliteCacheStore;
use salain::Label;
use tempfile::tempdir;

const BODY: &str = "## Potential Warning Signs:\n\n- num_links\n- urgency_score\n";

fn bench_put(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("explanations.db");
    let store = SqliteCacheStore::open(&path, b"bench-secret").unwrap();
    let key = cache_key("bench", Label::Malicious, 0.9);

    c.bench_function("storage_put_explanation", |b| {
        b.iter(|| black_box(store.put(&key, BODY)).unwrap())
    });
}

fn bench_get(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("explanations.db");
    let store = SqliteCacheStore::open(&path, b"bench-secret").unwrap();
    let key = cache_key("bench", Label::Malicious, 0.9);
    store.put(&key, BODY).unwrap();

    c.bench_function("storage_get_explanation", |b| {
        b.iter(|| black_box(store.get(&key)).unwrap())
    });
}

criterion_group!(benches, bench_put, bench_get);
criterion_main!(benches);
