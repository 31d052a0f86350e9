//! Tenure provides a fixed capacity, thread safe in-memory LRU cache.
//!
//! # Introduction
//! **Tenure** is a building block to bound the memory used by a working set. Callers put and get
//! arbitrary key/value pairs and the cache automatically discards the least recently used entry
//! once it would grow beyond its capacity. An optional callback is notified about each entry
//! removed this way.
//!
//! # Features
//! * **O(1) operations**: lookups, inserts, removals and evictions all run in constant time, as
//!   the cache combines a hash index with an index-linked recency list.
//! * **Thread safe**: all operations take **&self** and are guarded by a single lock per cache.
//!   Pure reads (like **peek** or **contains**) share this lock, everything which touches the
//!   recency order (including **get**) locks exclusively.
//! * **Eviction callbacks**: each entry removed by the eviction policy (on overflow, when shrinking
//!   the capacity or when purging the cache) is handed to an optional callback. Explicitly removed
//!   entries are not reported.
//! * **Reload-aware config facility**: caches can be declared in a YAML config and re-sized
//!   once the config changes. See [config](config).
//!
//! # Modules
//! * [lru]: the cache itself.
//! * [config]: YAML based settings for named caches.
//! * [fmt]: parsing helpers for capacity expressions like `4k`.
//!
//! # Examples
//! ```
//! # use tenure::lru::LRUCache;
//! let lru = LRUCache::new(2).unwrap();
//! lru.put("a", 1);
//! lru.put("b", 2);
//! assert_eq!(lru.get("a"), Some(1));
//!
//! // "b" is now the least recently used entry and makes room for "c"...
//! assert_eq!(lru.put("c", 3), true);
//! assert_eq!(lru.contains("b"), false);
//! ```
#![deny(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_results
)]
use simplelog::{format_description, ConfigBuilder, LevelFilter, SimpleLogger};
use std::sync::OnceLock;

pub mod config;
pub mod fmt;
pub mod lru;

/// Contains the version of the Tenure library.
pub const TENURE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initializes the logging system.
///
/// Installs a [SimpleLogger](simplelog::SimpleLogger) which reports everything down to
/// **debug**. This can safely be called several times, only the first invocation tries to
/// install the logger.
///
/// Returns **true** if our logger is active. If the application already installed another
/// logger, that one is kept and **false** is returned.
pub fn init_logging() -> bool {
    static LOGGER_INSTALLED: OnceLock<bool> = OnceLock::new();

    *LOGGER_INSTALLED.get_or_init(
        || match SimpleLogger::init(LevelFilter::Debug, logging_config()) {
            Ok(()) => true,
            Err(error) => {
                log::warn!("Keeping the already installed logger: {}", error);
                false
            }
        },
    )
}

fn logging_config() -> simplelog::Config {
    ConfigBuilder::new()
        .set_time_format_custom(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
        ))
        .set_thread_level(LevelFilter::Debug)
        .set_target_level(LevelFilter::Debug)
        .set_location_level(LevelFilter::Off)
        .build()
}

#[cfg(test)]
mod tests {
    use crate::lru::{FnvLRUCache, LRUCache};

    #[test]
    fn logging_can_be_initialized_repeatedly() {
        let installed = crate::init_logging();
        assert_eq!(crate::init_logging(), installed);

        // Evictions are logged, which must not interfere with the cache itself...
        let lru: FnvLRUCache<i32, i32> = LRUCache::builder(1)
            .with_hasher(fnv::FnvBuildHasher::default())
            .build()
            .unwrap();
        assert_eq!(lru.put(1, 1), false);
        assert_eq!(lru.put(2, 2), true);
    }
}
