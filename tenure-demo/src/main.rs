use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tenure::config::Config;
use tenure::lru::{FnvLRUCache, LRUCache, LRUController};

/// Declares the caches used below. In a real application this would be read from disk via
/// **Config::load**.
const SETTINGS: &str = "
caches:
    walkthrough:
        capacity: 3
    shared:
        capacity: 1k
";

/// The same settings but with a much smaller shared cache.
const SHRUNK_SETTINGS: &str = "
caches:
    walkthrough:
        capacity: 3
    shared:
        capacity: 100
";

const WORKERS: u64 = 8;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if !tenure::init_logging() {
        eprintln!("Another logger is already installed, demo output goes there.");
    }
    log::info!("Tenure demo (version {})", tenure::TENURE_VERSION);

    let config = Config::new("settings.yml");
    config.load_from_string(SETTINGS)?;

    walkthrough(&config)?;
    shared_cache(&config).await?;

    Ok(())
}

/// Performs a handful of operations on a tiny cache and reports each eviction.
fn walkthrough(config: &Config) -> anyhow::Result<()> {
    let capacity = config
        .current()
        .cache("walkthrough")
        .map(|settings| settings.capacity())
        .unwrap_or(3);

    let lru = LRUCache::with_callback(capacity, |key: &i32, value: &i32| {
        log::info!("Evicted {} -> {}", key, value)
    })?;

    // | 1 | 2 | 3 |
    for i in 1..=3 {
        if lru.put(i, i) {
            log::info!("Putting {} evicted another entry!", i);
        }
    }

    // | 1 | 3 | 2 | (most recently used first)
    if let Some(value) = lru.get(&1) {
        log::info!("Get 1 -> {}", value);
    }

    // | 4 | 1 | 3 |, "2" has been evicted...
    if lru.put(4, 4) {
        log::info!("Putting 4 evicted another entry!");
    }

    log::info!("Keys (least recently used first): {:?}", lru.keys());
    log::info!("Next to go: {:?}", lru.least_recently_used());

    Ok(())
}

/// Fills the given cache with entries derived from the given worker id.
fn fill(cache: &dyn LRUController<u64, String>, worker: u64) -> usize {
    (0..1000)
        .map(|i| worker * 1000 + i)
        .filter(|&key| cache.put(key, format!("value-{}", key)))
        .count()
}

/// Shares a cache among several tasks and re-sizes it once the config changes.
async fn shared_cache(config: &Config) -> anyhow::Result<()> {
    let settings = config.current();
    let capacity = settings
        .cache("shared")
        .map(|settings| settings.capacity())
        .unwrap_or(1024);

    let evictions = Arc::new(AtomicUsize::new(0));
    let counter = evictions.clone();
    let cache: Arc<FnvLRUCache<u64, String>> = Arc::new(
        LRUCache::builder(capacity)
            .with_hasher(fnv::FnvBuildHasher::default())
            .on_evicted(move |_: &u64, _: &String| {
                let _ = counter.fetch_add(1, Ordering::Relaxed);
            })
            .build()?,
    );

    let handles = (0..WORKERS)
        .map(|worker| {
            let cache = cache.clone();
            tokio::spawn(async move {
                let evicted = fill(cache.as_ref(), worker);
                let hits = (0..1000)
                    .filter(|i| cache.get(&(worker * 1000 + i)).is_some())
                    .count();
                (evicted, hits)
            })
        })
        .collect::<Vec<_>>();

    for (worker, handle) in handles.into_iter().enumerate() {
        let (evicted, hits) = handle.await?;
        log::info!(
            "Worker {} caused {} evictions and found {} of its entries.",
            worker,
            evicted,
            hits
        );
    }

    let stats = cache.stats();
    log::info!(
        "Shared cache: {} of {} entries ({:.1}% utilization), hit rate {:.1}%, {} evictions ({} reported).",
        stats.len,
        stats.capacity,
        stats.utilization(),
        stats.hit_rate(),
        stats.evictions,
        evictions.load(Ordering::Relaxed)
    );

    // Simulate a config change which shrinks the shared cache...
    config.load_from_string(SHRUNK_SETTINGS)?;
    if let Some(settings) = config.current().cache("shared") {
        let evicted = settings.apply(cache.as_ref())?;
        log::info!(
            "Shrinking the shared cache to {} entries evicted {} entries.",
            cache.capacity(),
            evicted
        );
    }

    cache.purge();
    log::info!(
        "Purged the shared cache, {} evictions reported in total.",
        evictions.load(Ordering::Relaxed)
    );

    Ok(())
}
