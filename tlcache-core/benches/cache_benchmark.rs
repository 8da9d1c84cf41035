use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::thread;
use tlcache_core::config::EntryStoreConfig;
use tlcache_core::entry::Entry;
use tlcache_core::entry_store::EntryStore;
use tlcache_core::eviction::EvictionPolicy;

fn entry_store(policy: EvictionPolicy, max_entries: usize) -> EntryStore {
    EntryStore::new(EntryStoreConfig {
        max_entries,
        eviction_policy: policy,
        ..EntryStoreConfig::default()
    })
}

fn sample_entry(key: &str) -> Entry {
    Entry::new(key, "hello world", "en", "fr", "bonjour le monde", 0.9, 3_600_000)
}

fn bench_insert_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_sequential");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("FIFO", size), size, |b, &size| {
            b.iter(|| {
                let store = entry_store(EvictionPolicy::FIFO, size);
                for i in 0..size {
                    store.add(sample_entry(&format!("key{i}")));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("LRU", size), size, |b, &size| {
            b.iter(|| {
                let store = entry_store(EvictionPolicy::LRU, size);
                for i in 0..size {
                    store.add(sample_entry(&format!("key{i}")));
                }
            });
        });
    }

    group.finish();
}

fn bench_find_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_sequential");

    for size in [10, 100, 1000].iter() {
        let store = entry_store(EvictionPolicy::FIFO, *size);
        for i in 0..*size {
            store.add(sample_entry(&format!("key{i}")));
        }

        group.bench_with_input(BenchmarkId::new("FIFO", size), size, |b, &size| {
            b.iter(|| {
                for i in 0..size {
                    black_box(store.find(&format!("key{i}")));
                }
            });
        });

        let lru_store = entry_store(EvictionPolicy::LRU, *size);
        for i in 0..*size {
            lru_store.add(sample_entry(&format!("key{i}")));
        }

        group.bench_with_input(BenchmarkId::new("LRU", size), size, |b, &size| {
            b.iter(|| {
                for i in 0..size {
                    black_box(lru_store.find(&format!("key{i}")));
                }
            });
        });
    }

    group.finish();
}

fn bench_concurrent_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_reads");

    for num_threads in [2, 4, 8].iter() {
        let store = Arc::new(entry_store(EvictionPolicy::LRU, 100));
        for i in 0..100 {
            store.add(sample_entry(&format!("key{i}")));
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(num_threads),
            num_threads,
            |b, &num_threads| {
                b.iter(|| {
                    let handles: Vec<_> = (0..num_threads)
                        .map(|_| {
                            let store = Arc::clone(&store);
                            thread::spawn(move || {
                                for i in 0..100 {
                                    black_box(store.find(&format!("key{}", i % 100)));
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_concurrent_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_mixed");

    for num_threads in [2, 4, 8].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_threads),
            num_threads,
            |b, &num_threads| {
                b.iter(|| {
                    let store = Arc::new(entry_store(EvictionPolicy::LRU, 1000));
                    let handles: Vec<_> = (0..num_threads)
                        .map(|thread_id| {
                            let store = Arc::clone(&store);
                            thread::spawn(move || {
                                for i in 0..50 {
                                    let key = format!("key{}", thread_id * 50 + i);
                                    if i % 2 == 0 {
                                        store.add(black_box(sample_entry(&key)));
                                    } else {
                                        black_box(store.find(&key));
                                    }
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("eviction");

    group.bench_function("FIFO_eviction", |b| {
        b.iter(|| {
            let store = entry_store(EvictionPolicy::FIFO, 50);
            for i in 0..100 {
                store.add(black_box(sample_entry(&format!("key{i}"))));
            }
        });
    });

    group.bench_function("LRU_eviction", |b| {
        b.iter(|| {
            let store = entry_store(EvictionPolicy::LRU, 50);
            for i in 0..100 {
                store.add(black_box(sample_entry(&format!("key{i}"))));
            }
        });
    });

    group.bench_function("LFU_eviction", |b| {
        b.iter(|| {
            let store = entry_store(EvictionPolicy::LFU, 50);
            for i in 0..100 {
                store.add(black_box(sample_entry(&format!("key{i}"))));
            }
        });
    });

    group.finish();
}

fn bench_fingerprint(c: &mut Criterion) {
    use tlcache_core::config::FingerprintConfig;
    use tlcache_core::fingerprint::fingerprint;

    let config = FingerprintConfig::default();
    c.bench_function("fingerprint_short_text", |b| {
        b.iter(|| black_box(fingerprint("hello world", "en", "fr", &config, None).unwrap()));
    });

    let long_text = "the quick brown fox jumps over the lazy dog ".repeat(20);
    c.bench_function("fingerprint_long_text", |b| {
        b.iter(|| black_box(fingerprint(&long_text, "en", "fr", &config, None).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_insert_sequential,
    bench_find_sequential,
    bench_concurrent_reads,
    bench_concurrent_mixed,
    bench_eviction,
    bench_fingerprint
);
criterion_main!(benches);
