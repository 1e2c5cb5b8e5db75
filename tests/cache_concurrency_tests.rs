//! Concurrency Tests for the Cache Engine
//!
//! Hammers shared caches from many tasks and threads and checks that the
//! bounds and counters stay consistent.

use std::sync::Arc;
use std::time::Duration;

use listing_cache::cache::{ImageCache, LruCache, PropertyCache};
use listing_cache::config::{ImageCacheConfig, PropertyCacheConfig};

const WORKERS: usize = 8;
const OPS_PER_WORKER: usize = 500;

#[test]
fn test_parallel_access_respects_bounds() {
    let cache: Arc<LruCache<Vec<u8>>> = Arc::new(LruCache::new(64, 4096));

    std::thread::scope(|scope| {
        for worker in 0..WORKERS {
            let cache = Arc::clone(&cache);
            scope.spawn(move || {
                for i in 0..OPS_PER_WORKER {
                    let key = format!("k{}", (worker * 31 + i) % 128);
                    if i % 3 == 0 {
                        cache.get(&key);
                    } else {
                        let size = (i % 97) as u64;
                        cache.set(key, vec![0u8; size as usize], size, Duration::ZERO);
                    }
                }
            });
        }
    });

    let stats = cache.stats();
    assert!(stats.size <= 64);
    assert!(stats.current_bytes <= 4096);
    assert_eq!(stats.size, cache.keys().len());

    let gets = (WORKERS * OPS_PER_WORKER.div_ceil(3)) as u64;
    assert_eq!(stats.hits + stats.misses, gets);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sweep_runs_alongside_readers() {
    let config = PropertyCacheConfig {
        default_ttl: Duration::from_millis(20),
        cleanup_interval: Duration::from_millis(10),
        ..PropertyCacheConfig::default()
    };
    let cache = Arc::new(PropertyCache::new(config));
    let handle = cache.spawn_cleanup().unwrap();

    let mut tasks = Vec::new();
    for worker in 0..WORKERS {
        let cache = Arc::clone(&cache);
        tasks.push(tokio::spawn(async move {
            for i in 0..50 {
                let id = format!("{}", (worker + i) % 16);
                if cache.get_property(&id).is_none() {
                    let mut listing = sample_listing(&id);
                    listing.price = i as f64;
                    cache.set_property(&listing);
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(cache.is_empty());

    handle.shutdown().await;
}

#[test]
fn test_invalidation_races_with_writers() {
    let cache = Arc::new(ImageCache::new(ImageCacheConfig {
        capacity: 0,
        max_size_bytes: 0,
        ..ImageCacheConfig::default()
    }));

    std::thread::scope(|scope| {
        for worker in 0..WORKERS {
            let cache = Arc::clone(&cache);
            scope.spawn(move || {
                for i in 0..OPS_PER_WORKER {
                    let id = format!("p{}", i % 4);
                    if worker == 0 && i % 10 == 0 {
                        cache.invalidate_image(&id);
                    } else {
                        cache.set_thumbnail(&id, (i % 5) as u32 * 100, vec![0u8; 8], "image/jpeg");
                    }
                }
            });
        }
    });

    for id in ["p0", "p1", "p2", "p3"] {
        cache.invalidate_image(id);
        assert!(cache.tracked_keys(id).is_empty());
    }
    assert!(cache.is_empty());
}

fn sample_listing(id: &str) -> listing_cache::models::Property {
    let now = chrono::Utc::now();
    listing_cache::models::Property {
        id: id.to_string(),
        title: format!("Listing {id}"),
        description: String::new(),
        price: 0.0,
        city: "Lyon".to_string(),
        address: String::new(),
        property_type: "apartment".to_string(),
        bedrooms: 1,
        bathrooms: 1,
        area_sqm: 30.0,
        agency_id: None,
        created_at: now,
        updated_at: now,
    }
}
