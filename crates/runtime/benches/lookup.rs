use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hearth_core::{Locale, OwnerId};
use hearth_provider::MemorySource;
use hearth_runtime::ResourceCache;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_cache(owners: usize, keys: usize) -> (ResourceCache, Vec<OwnerId>) {
    let en: Locale = "en".parse().unwrap();
    let source = MemorySource::new(en.clone());
    let ids: Vec<OwnerId> = (0..owners)
        .map(|i| OwnerId::from(format!("app.component{i}")))
        .collect();
    for id in &ids {
        source.insert(
            id.clone(),
            en.clone(),
            (0..keys).map(|k| (format!("key.{k}"), format!("Value number {k}"))),
        );
    }
    (ResourceCache::new(Arc::new(source), en), ids)
}

// ---------------------------------------------------------------------------
// Benchmark: cache hit
// ---------------------------------------------------------------------------

fn bench_cache_hit(c: &mut Criterion) {
    let en: Locale = "en".parse().unwrap();
    let mut group = c.benchmark_group("cache_get_hit");
    for owners in [1, 16, 64] {
        let (cache, ids) = make_cache(owners, 50);
        for id in &ids {
            cache.get(id, &en);
        }
        group.bench_with_input(BenchmarkId::from_parameter(owners), &ids, |b, ids| {
            b.iter(|| {
                for id in ids {
                    black_box(cache.get(id, &en));
                }
            })
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: text lookup (hit and echoed miss)
// ---------------------------------------------------------------------------

fn bench_text(c: &mut Criterion) {
    let en: Locale = "en".parse().unwrap();
    let (cache, ids) = make_cache(1, 500);
    let handle = cache.get(&ids[0], &en);

    c.bench_function("text_hit", |b| b.iter(|| black_box(handle.text("key.250"))));
    c.bench_function("text_miss", |b| b.iter(|| black_box(handle.text("absent.key"))));
}

criterion_group!(benches, bench_cache_hit, bench_text);
criterion_main!(benches);
