use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::hash::{BuildHasher, Hash};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::lru::builder::Builder;
use crate::lru::links::Links;

/// Represents the callback which is notified about each entry removed by the eviction policy.
///
/// The callback is invoked synchronously while the cache is locked. Therefore it must neither
/// block for long nor call back into the same cache (which would deadlock).
pub type EvictionCallback<K, V> = Box<dyn Fn(&K, &V) + Send + Sync>;

/// Represents an error when creating or re-configuring a cache.
///
/// Note that misses (e.g. **get** for an unknown key) are not errors but simply reported as
/// **None** or **false**.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Signals that an invalid argument (e.g. a capacity of zero) was given.
    InvalidArgument(String),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::InvalidArgument(message) => write!(f, "Invalid argument: {}", message),
        }
    }
}

impl std::error::Error for CacheError {}

/// Describes the operations provided by a thread safe LRU cache.
///
/// This is implemented by [LRUCache](LRUCache) and permits callers to depend on the contract
/// rather than on a concrete cache type (e.g. to hand in a cache using a custom hasher).
///
/// # Examples
/// ```
/// # use tenure::lru::{LRUCache, LRUController};
/// fn warm_up(cache: &dyn LRUController<i32, String>) {
///     for i in 0..10 {
///         cache.put(i, i.to_string());
///     }
/// }
///
/// let lru = LRUCache::<i32, String>::new(4).unwrap();
/// warm_up(&lru);
/// assert_eq!(lru.len(), 4);
/// assert_eq!(lru.keys(), vec![6, 7, 8, 9]);
/// ```
pub trait LRUController<K, V> {
    /// Fetches the value for the given key and marks the entry as most recently used.
    fn get(&self, key: &K) -> Option<V>;

    /// Stores the value for the given key. Returns **true** if another entry was evicted.
    fn put(&self, key: K, value: V) -> bool;

    /// Removes the entry for the given key. Returns **true** if an entry was present.
    fn remove(&self, key: &K) -> bool;

    /// Lists all keys, least recently used first.
    fn keys(&self) -> Vec<K>;

    /// Fetches the value for the given key without touching the recency order.
    fn peek(&self, key: &K) -> Option<V>;

    /// Determines if there is an entry for the given key without touching the recency order.
    fn contains(&self, key: &K) -> bool;

    /// Evicts all entries.
    fn purge(&self);

    /// Returns the number of entries.
    fn len(&self) -> usize;

    /// Determines if there are no entries at all.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the max number of entries.
    fn capacity(&self) -> usize;

    /// Changes the max number of entries and returns the number of evicted entries.
    fn adjust_capacity(&self, capacity: usize) -> Result<usize, CacheError>;
}

/// Provides a snapshot of the size and the usage metrics of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// The number of entries at the time the snapshot was taken.
    pub len: usize,
    /// The max number of entries.
    pub capacity: usize,
    /// The number of **get** calls.
    pub reads: usize,
    /// The number of **get** calls which found a value.
    pub hits: usize,
    /// The number of **put** and **remove** calls.
    pub writes: usize,
    /// The number of entries removed by the eviction policy (including **purge**).
    pub evictions: usize,
}

impl CacheStats {
    /// Returns the cache hit rate in percent.
    pub fn hit_rate(&self) -> f32 {
        match self.reads {
            0 => 0.,
            n => self.hits as f32 / n as f32 * 100.,
        }
    }

    /// Returns the cache utilization in percent.
    pub fn utilization(&self) -> f32 {
        self.len as f32 / self.capacity as f32 * 100.
    }
}

/// Provides a fixed capacity, thread safe LRU cache.
///
/// A cache behaves just like a **Map** as long as there is room left. Once a new entry would
/// make it grow beyond its capacity, the least recently used entry is evicted - hence the name
/// LRU cache. An optional callback is notified for each entry removed by this policy (but not
/// for entries removed via [remove](LRUCache::remove)).
///
/// All operations take **&self** as the cache is guarded by a single lock. Therefore a cache
/// can simply be wrapped in an **Arc** and shared among threads.
///
/// # Examples
/// ```
/// # use tenure::lru::LRUCache;
/// # use std::sync::Arc;
/// # use std::sync::atomic::{AtomicUsize, Ordering};
/// let evictions = Arc::new(AtomicUsize::new(0));
/// let counter = evictions.clone();
///
/// // Specifies a cache which can store up to 2 entries and counts each eviction...
/// let lru = LRUCache::with_callback(2, move |_key: &String, _value: &String| {
///     let _ = counter.fetch_add(1, Ordering::SeqCst);
/// })
/// .unwrap();
///
/// lru.put("Foo".to_owned(), "Bar".to_owned());
/// lru.put("Foo1".to_owned(), "Bar1".to_owned());
/// assert_eq!(lru.get("Foo").unwrap(), "Bar");
///
/// // this will no longer fit and throw out "Foo1" as "Foo" was used more recently...
/// assert_eq!(lru.put("Foo2".to_owned(), "Bar2".to_owned()), true);
/// assert_eq!(lru.contains("Foo1"), false);
/// assert_eq!(lru.contains("Foo"), true);
/// assert_eq!(evictions.load(Ordering::SeqCst), 1);
///```
pub struct LRUCache<K, V, S = RandomState> {
    state: RwLock<State<K, V, S>>,
    on_evicted: Option<EvictionCallback<K, V>>,
}

/// Everything guarded by the lock of a cache.
struct State<K, V, S> {
    capacity: usize,
    links: Links<K, V>,
    index: HashMap<K, usize, S>,
    reads: usize,
    hits: usize,
    writes: usize,
    evictions: usize,
}

impl<K: Eq + Hash, V, S: BuildHasher> State<K, V, S> {
    /// Removes the least recently used entry and notifies the callback.
    ///
    /// Returns **false** if there was nothing left to evict.
    fn evict_lru(&mut self, on_evicted: Option<&EvictionCallback<K, V>>) -> bool {
        match self.links.pop_back() {
            Some((key, value)) => {
                let _ = self.index.remove(&key);
                self.evictions += 1;
                if let Some(callback) = on_evicted {
                    callback(&key, &value);
                }
                true
            }
            None => false,
        }
    }

    /// Evicts entries until at most **capacity** remain and only then adopts the new capacity.
    ///
    /// If a callback panics halfway, the previous capacity (which still holds) stays in place.
    fn shrink_to(
        &mut self,
        capacity: usize,
        on_evicted: Option<&EvictionCallback<K, V>>,
    ) -> usize {
        let mut evicted = 0;
        while self.links.len() > capacity && self.evict_lru(on_evicted) {
            evicted += 1;
        }
        self.capacity = capacity;

        evicted
    }
}

/// Caps the number of entries for which memory is reserved up front, so that a huge capacity
/// doesn't allocate everything before the first put.
const MAX_PREALLOCATED_ENTRIES: usize = 1024;

fn verify_capacity(capacity: usize) -> Result<(), CacheError> {
    if capacity == 0 {
        Err(CacheError::InvalidArgument(
            "An LRU cache must be initialized with a capacity greater than zero".to_owned(),
        ))
    } else {
        Ok(())
    }
}

impl<K: Eq + Hash + Clone, V> LRUCache<K, V, RandomState> {
    /// Creates a new cache which can store up to **capacity** entries.
    ///
    /// # Errors
    /// Fails with **CacheError::InvalidArgument** if the given capacity is zero.
    ///
    /// # Examples
    /// ```
    /// # use tenure::lru::{CacheError, LRUCache};
    /// let lru = LRUCache::<String, String>::new(128).unwrap();
    /// assert_eq!(lru.capacity(), 128);
    /// assert_eq!(lru.is_empty(), true);
    ///
    /// assert_eq!(LRUCache::<String, String>::new(0).is_err(), true);
    /// ```
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        LRUCache::from_parts(capacity, RandomState::new(), None)
    }

    /// Creates a new cache which invokes the given callback for each evicted entry.
    ///
    /// Note that the callback is invoked while the cache is locked and must therefore not call
    /// back into the same cache.
    pub fn with_callback(
        capacity: usize,
        callback: impl Fn(&K, &V) + Send + Sync + 'static,
    ) -> Result<Self, CacheError> {
        LRUCache::from_parts(capacity, RandomState::new(), Some(Box::new(callback)))
    }

    /// Provides a builder to set up a cache with a custom hasher and / or eviction callback.
    ///
    /// # Examples
    /// ```
    /// # use tenure::lru::LRUCache;
    /// let lru = LRUCache::builder(16)
    ///     .with_hasher(fnv::FnvBuildHasher::default())
    ///     .on_evicted(|key: &u32, value: &u32| log::debug!("Evicted {} = {}", key, value))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(lru.put(1, 1), false);
    /// assert_eq!(lru.get(&1), Some(1));
    /// ```
    pub fn builder(capacity: usize) -> Builder<K, V> {
        Builder::new(capacity)
    }
}

impl<K: Eq + Hash + Clone, V, S: BuildHasher> LRUCache<K, V, S> {
    pub(crate) fn from_parts(
        capacity: usize,
        hasher: S,
        on_evicted: Option<EvictionCallback<K, V>>,
    ) -> Result<Self, CacheError> {
        verify_capacity(capacity)?;

        let preallocated = capacity.min(MAX_PREALLOCATED_ENTRIES);
        Ok(LRUCache {
            state: RwLock::new(State {
                capacity,
                links: Links::with_capacity(preallocated),
                index: HashMap::with_capacity_and_hasher(preallocated, hasher),
                reads: 0,
                hits: 0,
                writes: 0,
                evictions: 0,
            }),
            on_evicted,
        })
    }

    // A panicking callback poisons the lock. As list and index are always updated before the
    // callback runs, the state is still consistent and can be used as is.
    fn read(&self) -> RwLockReadGuard<'_, State<K, V, S>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State<K, V, S>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the value stored for the given key or **None** if no value is present.
    ///
    /// A hit marks the entry as most recently used, therefore this requires exclusive access
    /// to the cache even though it is "only" a read.
    ///
    /// # Examples
    /// ```
    /// # use tenure::lru::LRUCache;
    /// let lru = LRUCache::new(2).unwrap();
    /// lru.put(1, "one");
    /// lru.put(2, "two");
    ///
    /// // Using "1" saves it from being evicted by the next insert...
    /// assert_eq!(lru.get(&1), Some("one"));
    /// lru.put(3, "three");
    ///
    /// assert_eq!(lru.get(&1), Some("one"));
    /// assert_eq!(lru.get(&2), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let mut guard = self.write();
        let state = &mut *guard;
        state.reads += 1;

        let index = *state.index.get(key)?;
        state.hits += 1;
        state.links.move_to_front(index);
        state.links.entry(index).map(|(_, value)| value.clone())
    }

    /// Stores the given value for the given key and marks it as most recently used.
    ///
    /// If the key is already present, its value is replaced and nothing is ever evicted.
    /// Otherwise, if the new entry makes the cache grow beyond its capacity, the least recently
    /// used entry is evicted (and handed to the eviction callback).
    ///
    /// Returns **true** if an entry was evicted, **false** otherwise.
    ///
    /// # Examples
    /// ```
    /// # use tenure::lru::LRUCache;
    /// let lru = LRUCache::new(1).unwrap();
    /// assert_eq!(lru.put("a", 1), false);
    ///
    /// // Updating an existing entry never evicts...
    /// assert_eq!(lru.put("a", 2), false);
    /// assert_eq!(lru.peek("a"), Some(2));
    ///
    /// // ..but a new one has to make room.
    /// assert_eq!(lru.put("b", 3), true);
    /// assert_eq!(lru.keys(), vec!["b"]);
    /// ```
    pub fn put(&self, key: K, value: V) -> bool {
        let mut guard = self.write();
        let state = &mut *guard;
        state.writes += 1;

        if let Some(&index) = state.index.get(&key) {
            if let Some(current) = state.links.value_mut(index) {
                *current = value;
            }
            state.links.move_to_front(index);
            return false;
        }

        let index = state.links.push_front(key.clone(), value);
        let _ = state.index.insert(key, index);

        if state.links.len() > state.capacity {
            let evicted = state.evict_lru(self.on_evicted.as_ref());
            log::debug!(
                "Evicted the least recently used entry to stay within a capacity of {}.",
                state.capacity
            );
            evicted
        } else {
            false
        }
    }

    /// Removes the entry for the given key if present.
    ///
    /// Note that this is not considered an eviction, therefore the eviction callback is not
    /// invoked.
    ///
    /// Returns **true** if an entry was removed, **false** if there was none.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut guard = self.write();
        let state = &mut *guard;
        state.writes += 1;

        match state.index.remove(key) {
            Some(index) => {
                let _ = state.links.remove(index);
                true
            }
            None => false,
        }
    }

    /// Determines if an entry for the given key is present.
    ///
    /// In contrast to [get](LRUCache::get) this doesn't mark the entry as recently used.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.read().index.contains_key(key)
    }

    /// Returns a copy of the value stored for the given key without marking it as recently used.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let state = self.read();
        let index = *state.index.get(key)?;
        state.links.entry(index).map(|(_, value)| value.clone())
    }

    /// Returns all keys currently present, starting with the least recently used one.
    pub fn keys(&self) -> Vec<K> {
        self.read().links.keys_from_back().cloned().collect()
    }

    /// Returns the least recently used entry (the next one to be evicted) or **None** if the
    /// cache is empty.
    ///
    /// # Examples
    /// ```
    /// # use tenure::lru::LRUCache;
    /// let lru = LRUCache::new(4).unwrap();
    /// assert_eq!(lru.least_recently_used(), None);
    ///
    /// lru.put(1, 1);
    /// lru.put(2, 2);
    /// assert_eq!(lru.least_recently_used(), Some((1, 1)));
    ///
    /// let _ = lru.get(&1);
    /// assert_eq!(lru.least_recently_used(), Some((2, 2)));
    /// ```
    pub fn least_recently_used(&self) -> Option<(K, V)>
    where
        V: Clone,
    {
        let state = self.read();
        let index = state.links.back()?;
        state
            .links
            .entry(index)
            .map(|(key, value)| (key.clone(), value.clone()))
    }

    /// Evicts all entries.
    ///
    /// The eviction callback is invoked for each entry, starting with the least recently used.
    ///
    /// # Examples
    /// ```
    /// # use tenure::lru::LRUCache;
    /// # use std::sync::{Arc, Mutex};
    /// let evicted = Arc::new(Mutex::new(Vec::new()));
    /// let sink = evicted.clone();
    /// let lru = LRUCache::with_callback(8, move |key: &i32, _: &i32| {
    ///     sink.lock().unwrap().push(*key);
    /// })
    /// .unwrap();
    ///
    /// lru.put(1, 1);
    /// lru.put(2, 2);
    /// lru.put(3, 3);
    /// lru.purge();
    ///
    /// assert_eq!(lru.is_empty(), true);
    /// assert_eq!(*evicted.lock().unwrap(), vec![1, 2, 3]);
    /// ```
    pub fn purge(&self) {
        let mut guard = self.write();
        let state = &mut *guard;

        let mut evicted = 0;
        while state.evict_lru(self.on_evicted.as_ref()) {
            evicted += 1;
        }

        state.links.clear();
        state.index.clear();

        log::debug!("Purged {} entries from the cache.", evicted);
    }

    /// Returns the number of entries in the cache.
    pub fn len(&self) -> usize {
        self.read().links.len()
    }

    /// Determines if the cache is completely empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the overall capacity (max number of entries) of this cache.
    pub fn capacity(&self) -> usize {
        self.read().capacity
    }

    /// Changes the maximal number of entries permitted in this cache.
    ///
    /// If the cache currently holds more entries than permitted, the least recently used ones are
    /// evicted (and handed to the eviction callback) until it fits.
    ///
    /// Returns the number of evicted entries.
    ///
    /// # Errors
    /// Fails with **CacheError::InvalidArgument** if the given capacity is zero. In this case
    /// the cache remains unchanged.
    ///
    /// # Examples
    /// ```
    /// # use tenure::lru::LRUCache;
    /// let lru = LRUCache::new(10).unwrap();
    /// for i in 0..6 {
    ///     lru.put(i, i);
    /// }
    /// assert_eq!(lru.len(), 6);
    ///
    /// // Now request that the cache is reduced to only 3 entries...
    /// assert_eq!(lru.adjust_capacity(3).unwrap(), 3);
    /// assert_eq!(lru.capacity(), 3);
    ///
    /// // ensure that only the 3 most recently used entries remain...
    /// assert_eq!(lru.keys(), vec![3, 4, 5]);
    ///
    /// // growing never evicts anything...
    /// assert_eq!(lru.adjust_capacity(100).unwrap(), 0);
    /// assert_eq!(lru.adjust_capacity(0).is_err(), true);
    /// ```
    pub fn adjust_capacity(&self, capacity: usize) -> Result<usize, CacheError> {
        verify_capacity(capacity)?;

        let mut state = self.write();
        let previous_capacity = state.capacity;
        let evicted = state.shrink_to(capacity, self.on_evicted.as_ref());

        log::debug!(
            "Changed the cache capacity from {} to {} ({} entries evicted).",
            previous_capacity,
            capacity,
            evicted
        );

        Ok(evicted)
    }

    /// Returns a snapshot of the size and usage metrics of this cache.
    pub fn stats(&self) -> CacheStats {
        let state = self.read();
        CacheStats {
            len: state.links.len(),
            capacity: state.capacity,
            reads: state.reads,
            hits: state.hits,
            writes: state.writes,
            evictions: state.evictions,
        }
    }

    /// Zeroes all usage metrics (reads, hits, writes, evictions).
    pub fn reset_stats(&self) {
        let mut state = self.write();
        state.reads = 0;
        state.hits = 0;
        state.writes = 0;
        state.evictions = 0;
    }
}

impl<K: Eq + Hash + Clone, V: Clone, S: BuildHasher> LRUController<K, V> for LRUCache<K, V, S> {
    fn get(&self, key: &K) -> Option<V> {
        LRUCache::get(self, key)
    }

    fn put(&self, key: K, value: V) -> bool {
        LRUCache::put(self, key, value)
    }

    fn remove(&self, key: &K) -> bool {
        LRUCache::remove(self, key)
    }

    fn keys(&self) -> Vec<K> {
        LRUCache::keys(self)
    }

    fn peek(&self, key: &K) -> Option<V> {
        LRUCache::peek(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        LRUCache::contains(self, key)
    }

    fn purge(&self) {
        LRUCache::purge(self)
    }

    fn len(&self) -> usize {
        LRUCache::len(self)
    }

    fn capacity(&self) -> usize {
        LRUCache::capacity(self)
    }

    fn adjust_capacity(&self, capacity: usize) -> Result<usize, CacheError> {
        LRUCache::adjust_capacity(self, capacity)
    }
}
