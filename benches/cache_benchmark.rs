use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{seq::SliceRandom, thread_rng, Rng};
use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use vacancy_client::cache::{CacheConfig, ResponseCache};

// Mixed get/store load against the response cache at different capacities
pub fn cache_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("vacancy_response_cache");

    for max_entries in [10usize, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(max_entries),
            max_entries,
            |b, &max_entries| {
                b.iter(|| {
                    let cache = Arc::new(ResponseCache::new(CacheConfig {
                        default_ttl: Duration::from_secs(300),
                        max_entries,
                    }));

                    let hotels = (0..100)
                        .map(|i| format!("hotel{}", i))
                        .collect::<Vec<_>>();
                    let checkins = (1..29)
                        .map(|d| format!("2025-06-{:02}", d))
                        .collect::<Vec<_>>();

                    let mut handles = vec![];
                    for _ in 0..4 {
                        let cache = Arc::clone(&cache);
                        let hotels = hotels.clone();
                        let checkins = checkins.clone();

                        handles.push(thread::spawn(move || {
                            let mut rng = thread_rng();

                            for _ in 0..250 {
                                let hotel = hotels.choose(&mut rng).unwrap();
                                let checkin = checkins.choose(&mut rng).unwrap();
                                let key = format!(
                                    "/vagas/search?checkin={}&checkout=2025-06-30&hotel={}",
                                    checkin, hotel
                                );

                                if rng.gen_bool(0.3) {
                                    cache.store(
                                        &key,
                                        json!({ "success": true, "hasAvailability": true }),
                                    );
                                } else {
                                    let _ = cache.get(&key);
                                }
                            }
                        }));
                    }

                    for handle in handles {
                        handle.join().unwrap();
                    }

                    black_box(cache.len())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, cache_benchmark);
criterion_main!(benches);
