//! Provides a fixed capacity, thread safe LRU cache.
//!
//! An LRU cache drops the least recently used entry once it is about to grow beyond its
//! capacity. Each entry removed this way can be reported to an eviction callback, so that
//! the owner can e.g. write it back or release associated resources. Entries which are
//! explicitly removed via [LRUCache::remove](LRUCache::remove) are not reported, so a caller can
//! always distinguish "I removed it" from "the cache dropped it".
//!
//! Internally the cache combines a hash index with a doubly linked recency list. The list lives
//! in an arena and is linked via indices, so that the index can point into it and every operation
//! (lookup, insert, remove, promote, evict) runs in O(1). Both structures are guarded by a single
//! lock per cache. Operations which change the recency order (including **get**) lock
//! exclusively, pure reads (**peek**, **contains**, **keys**, **len**...) share the lock.
//!
//! # Examples
//! ```
//! # use tenure::lru::LRUCache;
//! # use std::sync::Arc;
//! let lru = Arc::new(LRUCache::new(3).unwrap());
//!
//! let writer = {
//!     let lru = lru.clone();
//!     std::thread::spawn(move || {
//!         for i in 0..10 {
//!             lru.put(i, i * 2);
//!         }
//!     })
//! };
//! writer.join().unwrap();
//!
//! assert_eq!(lru.len(), 3);
//! assert_eq!(lru.least_recently_used(), Some((7, 14)));
//! ```
mod builder;
mod links;
mod lru_cache;

pub use builder::Builder;
pub use lru_cache::CacheError;
pub use lru_cache::CacheStats;
pub use lru_cache::EvictionCallback;
pub use lru_cache::LRUCache;
pub use lru_cache::LRUController;

/// A cache which uses the FNV hash function for its key index.
///
/// FNV is noticeably faster than the default SipHash for small keys (like integers or short
/// strings) but provides no protection against hash flooding.
pub type FnvLRUCache<K, V> = LRUCache<K, V, fnv::FnvBuildHasher>;
