//! Provides a builder to set up an [LRUCache](crate::lru::LRUCache).
//!
//! Most caches only need a capacity and maybe an eviction callback, which is covered by
//! [LRUCache::new](crate::lru::LRUCache::new) and
//! [LRUCache::with_callback](crate::lru::LRUCache::with_callback). The builder additionally
//! permits to select the hasher used by the key index.
//!
//! # Example
//! ```
//! # use tenure::lru::LRUCache;
//! let lru = LRUCache::builder(1024)
//!     .on_evicted(|key: &String, _: &Vec<u8>| log::info!("Evicted {}", key))
//!     .build()
//!     .unwrap();
//!
//! lru.put("Foo".to_owned(), vec![1, 2, 3]);
//! assert_eq!(lru.peek("Foo"), Some(vec![1, 2, 3]));
//! ```
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

use crate::lru::{CacheError, EvictionCallback, LRUCache};

/// Collects the settings of a cache to be created.
pub struct Builder<K, V, S = RandomState> {
    capacity: usize,
    hasher: S,
    on_evicted: Option<EvictionCallback<K, V>>,
}

impl<K, V> Builder<K, V, RandomState> {
    /// Creates a new builder for a cache which can store up to **capacity** entries.
    ///
    /// Note that the capacity is only verified once [build](Builder::build) is invoked.
    pub fn new(capacity: usize) -> Self {
        Builder {
            capacity,
            hasher: RandomState::new(),
            on_evicted: None,
        }
    }
}

impl<K, V, S> Builder<K, V, S> {
    /// Installs a callback which is invoked for each entry removed by the eviction policy.
    ///
    /// Note that the callback is invoked while the cache is locked and must therefore not call
    /// back into the same cache.
    pub fn on_evicted(mut self, callback: impl Fn(&K, &V) + Send + Sync + 'static) -> Self {
        self.on_evicted = Some(Box::new(callback));
        self
    }

    /// Specifies the hasher to use for the key index.
    pub fn with_hasher<H: BuildHasher>(self, hasher: H) -> Builder<K, V, H> {
        Builder {
            capacity: self.capacity,
            hasher,
            on_evicted: self.on_evicted,
        }
    }

    /// Creates the cache.
    ///
    /// # Errors
    /// Fails with **CacheError::InvalidArgument** if the given capacity is zero.
    pub fn build(self) -> Result<LRUCache<K, V, S>, CacheError>
    where
        K: Eq + Hash + Clone,
        S: BuildHasher,
    {
        LRUCache::from_parts(self.capacity, self.hasher, self.on_evicted)
    }
}
