//! Micro-operation benchmarks for the ordered map and the LRU cache.
//!
//! Run with: `cargo bench --bench ops`
//!
//! Measures per-operation latency for lookup, bumping lookup, insert, and
//! cache add under identical conditions.

use std::hint::black_box;
use std::time::Instant;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use linkmap::map::LinkedMap;
use linkmap::policy::lru::LruCache;

const CAPACITY: usize = 16_384;
const OPS: u64 = 100_000;

// ============================================================================
// Map Lookup Latency (ns/op)
// ============================================================================

fn bench_map_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_get_ns");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("get", |b| {
        b.iter_custom(|iters| {
            let mut map = LinkedMap::with_capacity(CAPACITY);
            for i in 0..CAPACITY as u64 {
                map.insert(i, i);
            }
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    let key = i % (CAPACITY as u64);
                    black_box(map.get(&key));
                }
            }
            start.elapsed()
        })
    });

    group.bench_function("get_refresh", |b| {
        b.iter_custom(|iters| {
            let mut map = LinkedMap::with_capacity(CAPACITY);
            for i in 0..CAPACITY as u64 {
                map.insert(i, i);
            }
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    let key = i % (CAPACITY as u64);
                    black_box(map.get_refresh(&key));
                }
            }
            start.elapsed()
        })
    });

    group.finish();
}

// ============================================================================
// Map Insert Latency (ns/op)
// ============================================================================

fn bench_map_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_insert_ns");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("insert_new", |b| {
        b.iter_custom(|iters| {
            let mut total = std::time::Duration::ZERO;
            for _ in 0..iters {
                let mut map = LinkedMap::with_capacity(OPS as usize);
                let start = Instant::now();
                for i in 0..OPS {
                    black_box(map.insert(i, i));
                }
                total += start.elapsed();
            }
            total
        })
    });

    group.bench_function("insert_refresh_existing", |b| {
        b.iter_custom(|iters| {
            let mut map = LinkedMap::with_capacity(CAPACITY);
            for i in 0..CAPACITY as u64 {
                map.insert(i, i);
            }
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    let key = i % (CAPACITY as u64);
                    black_box(map.insert_refresh(key, i));
                }
            }
            start.elapsed()
        })
    });

    group.finish();
}

// ============================================================================
// Cache Add / Get Latency (ns/op)
// ============================================================================

fn bench_cache_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_ops_ns");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("add_with_eviction", |b| {
        b.iter_custom(|iters| {
            let cache: LruCache<u64, u64> = LruCache::new(CAPACITY);
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    black_box(cache.add(i, i));
                }
            }
            start.elapsed()
        })
    });

    group.bench_function("get_hit", |b| {
        b.iter_custom(|iters| {
            let cache: LruCache<u64, u64> = LruCache::new(CAPACITY);
            for i in 0..CAPACITY as u64 {
                cache.add(i, i);
            }
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    let key = i % (CAPACITY as u64);
                    black_box(cache.get(&key));
                }
            }
            start.elapsed()
        })
    });

    group.bench_function("peek_hit", |b| {
        b.iter_custom(|iters| {
            let cache: LruCache<u64, u64> = LruCache::new(CAPACITY);
            for i in 0..CAPACITY as u64 {
                cache.add(i, i);
            }
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    let key = i % (CAPACITY as u64);
                    black_box(cache.peek(&key));
                }
            }
            start.elapsed()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_map_get, bench_map_insert, bench_cache_ops);
criterion_main!(benches);
