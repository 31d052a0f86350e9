use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tenure::lru::{FnvLRUCache, LRUCache};

fn lookup_benchmarks(c: &mut Criterion) {
    c.bench_function("get (hit)", |b| {
        let lru = LRUCache::new(1024).unwrap();
        for i in 0..1024 {
            let _ = lru.put(i, i);
        }

        let mut key = 0;
        b.iter(|| {
            key = (key + 1) % 1024;
            black_box(lru.get(&key));
        })
    });

    c.bench_function("get (miss)", |b| {
        let lru = LRUCache::<i32, i32>::new(1024).unwrap();
        b.iter(|| {
            black_box(lru.get(&42));
        })
    });

    c.bench_function("peek", |b| {
        let lru = LRUCache::new(1024).unwrap();
        for i in 0..1024 {
            let _ = lru.put(i, i);
        }

        b.iter(|| {
            black_box(lru.peek(&512));
        })
    });
}

fn eviction_benchmarks(c: &mut Criterion) {
    c.bench_function("put (update)", |b| {
        let lru = LRUCache::new(1024).unwrap();
        let _ = lru.put(1, 1);
        b.iter(|| {
            black_box(lru.put(1, 2));
        })
    });

    c.bench_function("put (evicting)", |b| {
        let lru = LRUCache::with_callback(1024, |key: &u64, value: &u64| {
            black_box((key, value));
        })
        .unwrap();

        let mut key = 0;
        b.iter(|| {
            key += 1;
            black_box(lru.put(key, key));
        })
    });

    c.bench_function("put (evicting, fnv)", |b| {
        let lru: FnvLRUCache<u64, u64> = LRUCache::builder(1024)
            .with_hasher(fnv::FnvBuildHasher::default())
            .build()
            .unwrap();

        let mut key = 0;
        b.iter(|| {
            key += 1;
            black_box(lru.put(key, key));
        })
    });

    c.bench_function("purge 1024 entries", |b| {
        let lru = LRUCache::new(1024).unwrap();
        b.iter(|| {
            for i in 0..1024 {
                let _ = lru.put(i, i);
            }
            lru.purge();
        })
    });
}

fn contention_benchmarks(c: &mut Criterion) {
    c.bench_function("get/put from 4 threads", |b| {
        let lru = Arc::new(LRUCache::<usize, usize>::new(4096).unwrap());
        b.iter(|| {
            let handles = (0..4)
                .map(|thread| {
                    let lru = lru.clone();
                    std::thread::spawn(move || {
                        for i in 0..256 {
                            let key = thread * 256 + i;
                            let _ = lru.put(key, i);
                            black_box(lru.get(&key));
                        }
                    })
                })
                .collect::<Vec<_>>();

            for handle in handles {
                handle.join().unwrap();
            }
        })
    });
}

criterion_group!(
    benches,
    lookup_benchmarks,
    eviction_benchmarks,
    contention_benchmarks
);
criterion_main!(benches);
