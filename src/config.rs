//! Contains the cache configuration.
//!
//! Caches can be declared in a YAML file (or string) so that their capacity can be tuned
//! without recompiling. The config keeps the currently loaded [Settings](Settings) in an
//! **ArcSwap**, therefore it can be re-loaded at any time while other threads keep reading the
//! previous snapshot. A config which fails to parse is rejected as a whole and leaves the
//! current settings untouched.
//!
//! # Configuration
//! ```yaml
//! caches:
//!     sessions:
//!         # Specifies the maximal number of entries to store.
//!         # Supports common suffixes like: k, m, g
//!         capacity: 4k
//!     users:
//!         capacity: 128
//! ```
//!
//! # Examples
//! ```
//! # use tenure::config::Config;
//! let config = Config::new("settings.yml");
//! config.load_from_string("
//! caches:
//!     sessions:
//!         capacity: 4k
//! ").unwrap();
//!
//! let settings = config.current();
//! let sessions = settings.cache("sessions").unwrap();
//! assert_eq!(sessions.capacity(), 4096);
//!
//! // Create a cache based on the settings...
//! let cache = sessions.build::<String, String>().unwrap();
//! assert_eq!(cache.capacity(), 4096);
//! ```
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use anyhow::Context;
use arc_swap::ArcSwap;
use itertools::Itertools;
use yaml_rust::{Yaml, YamlLoader};

use crate::fmt::parse_capacity;
use crate::lru::{CacheError, LRUCache};

/// Contains the settings of a single named cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    name: String,
    capacity: usize,
}

impl CacheSettings {
    /// Returns the name of the cache.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the max number of entries of the cache.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new (empty) cache with the configured capacity.
    pub fn build<K: Eq + Hash + Clone, V>(&self) -> Result<LRUCache<K, V>, CacheError> {
        LRUCache::new(self.capacity)
    }

    /// Applies these settings to an existing cache.
    ///
    /// If the configured capacity is smaller than the current number of entries, the least
    /// recently used entries are evicted. Returns the number of evicted entries.
    pub fn apply<K: Eq + Hash + Clone, V, S: BuildHasher>(
        &self,
        cache: &LRUCache<K, V, S>,
    ) -> Result<usize, CacheError> {
        if cache.capacity() == self.capacity {
            return Ok(0);
        }

        let evicted = cache.adjust_capacity(self.capacity)?;
        log::info!(
            "Cache '{}' now has a capacity of {} entries ({} entries evicted).",
            self.name,
            self.capacity,
            evicted
        );

        Ok(evicted)
    }
}

/// Represents a fully parsed configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Settings {
    caches: Vec<CacheSettings>,
}

impl Settings {
    /// Parses the given YAML data.
    ///
    /// # Errors
    /// Fails if the data isn't valid YAML or if a cache is declared without a valid (positive)
    /// capacity.
    pub fn parse(data: &str) -> anyhow::Result<Settings> {
        let docs = YamlLoader::load_from_str(data)
            .map_err(|error| anyhow::anyhow!("Cannot parse config data: {}", error))?;

        match docs.first() {
            Some(doc) => Settings::from_yaml(doc),
            None => Ok(Settings::default()),
        }
    }

    fn from_yaml(doc: &Yaml) -> anyhow::Result<Settings> {
        let caches = match &doc["caches"] {
            Yaml::Hash(caches) => caches
                .iter()
                .map(|(name, settings)| parse_cache_settings(name, settings))
                .collect::<anyhow::Result<Vec<_>>>()?,
            Yaml::BadValue | Yaml::Null => Vec::new(),
            other => {
                return Err(anyhow::anyhow!(
                    "Expected 'caches' to be an object but found: {:?}",
                    other
                ))
            }
        };

        let caches: Vec<CacheSettings> = caches
            .into_iter()
            .sorted_by(|left, right| left.name.cmp(&right.name))
            .collect();

        // Integer keys are normalized to strings, so "1" and 1 end up with the same name.
        if let Some((duplicate, _)) = caches
            .iter()
            .tuple_windows()
            .find(|(left, right)| left.name == right.name)
        {
            return Err(anyhow::anyhow!(
                "Cache '{}' is declared more than once.",
                duplicate.name
            ));
        }

        Ok(Settings { caches })
    }

    /// Returns the settings of the cache with the given name.
    pub fn cache(&self, name: &str) -> Option<&CacheSettings> {
        self.caches.iter().find(|cache| cache.name == name)
    }

    /// Returns all declared caches, sorted by name.
    pub fn caches(&self) -> impl Iterator<Item = &CacheSettings> + '_ {
        self.caches.iter()
    }
}

fn parse_cache_settings(name: &Yaml, settings: &Yaml) -> anyhow::Result<CacheSettings> {
    let name = match name {
        Yaml::String(name) => name.clone(),
        Yaml::Integer(name) => name.to_string(),
        other => return Err(anyhow::anyhow!("Invalid cache name: {:?}", other)),
    };

    let capacity = match &settings["capacity"] {
        Yaml::Integer(capacity) => usize::try_from(*capacity).map_err(|_| {
            anyhow::anyhow!("The capacity of cache '{}' must not be negative.", name)
        })?,
        Yaml::String(capacity) => parse_capacity(capacity)
            .with_context(|| format!("Invalid capacity for cache '{}'", name))?,
        Yaml::BadValue => {
            return Err(anyhow::anyhow!(
                "Cache '{}' doesn't specify a capacity.",
                name
            ))
        }
        other => {
            return Err(anyhow::anyhow!(
                "Invalid capacity for cache '{}': {:?}",
                name,
                other
            ))
        }
    };

    if capacity == 0 {
        return Err(anyhow::anyhow!(
            "The capacity of cache '{}' must be greater than zero.",
            name
        ));
    }

    Ok(CacheSettings { name, capacity })
}

/// Provides access to the cache configuration.
///
/// The settings can be (re-)loaded at any time using [load](Config::load) or
/// [load_from_string](Config::load_from_string). A handle obtained via
/// [current](Config::current) is a snapshot and will not reflect later reloads.
pub struct Config {
    filename: String,
    settings: ArcSwap<Settings>,
}

impl Config {
    /// Creates a new and empty config which reads the given file once **load** is called.
    pub fn new(file: &str) -> Self {
        Config {
            filename: file.to_owned(),
            settings: ArcSwap::new(Arc::new(Settings::default())),
        }
    }

    /// Obtains the currently loaded settings.
    pub fn current(&self) -> Arc<Settings> {
        self.settings.load_full()
    }

    /// Reads the underlying file and replaces the current settings.
    ///
    /// # Errors
    /// Fails if the file cannot be read or parsed. In this case, the current settings remain
    /// active.
    pub fn load(&self) -> anyhow::Result<()> {
        log::info!("Loading config file {}...", &self.filename);

        let data = std::fs::read_to_string(&self.filename)
            .with_context(|| format!("Cannot load config file {}", &self.filename))?;

        self.load_from_string(data.as_str())
    }

    /// Loads a configuration from the given string instead of a file.
    ///
    /// # Errors
    /// Fails if the data cannot be parsed. In this case, the current settings remain active.
    pub fn load_from_string(&self, data: &str) -> anyhow::Result<()> {
        let settings = Settings::parse(data)
            .with_context(|| format!("Cannot parse config file {}", &self.filename))?;

        log::info!(
            "Loaded settings for {} cache(s) from {}.",
            settings.caches.len(),
            &self.filename
        );
        self.settings.store(Arc::new(settings));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{Config, Settings};
    use crate::lru::LRUCache;

    #[test]
    fn caches_are_parsed() {
        let settings = Settings::parse(
            "
caches:
    users:
        capacity: 128
    sessions:
        capacity: 2k
",
        )
        .unwrap();

        let names = settings.caches().map(|cache| cache.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["sessions", "users"]);
        assert_eq!(settings.cache("sessions").unwrap().capacity(), 2048);
        assert_eq!(settings.cache("users").unwrap().capacity(), 128);
        assert_eq!(settings.cache("unknown"), None);
    }

    #[test]
    fn empty_configs_are_accepted() {
        assert_eq!(Settings::parse("").unwrap(), Settings::default());
        assert_eq!(Settings::parse("other: 42").unwrap(), Settings::default());
    }

    #[test]
    fn invalid_capacities_are_rejected() {
        assert!(Settings::parse("caches:\n    a:\n        capacity: 0").is_err());
        assert!(Settings::parse("caches:\n    a:\n        capacity: -5").is_err());
        assert!(Settings::parse("caches:\n    a:\n        capacity: lots").is_err());
        assert!(Settings::parse("caches:\n    a:\n        size: 12").is_err());
        assert!(Settings::parse("caches: 12").is_err());
    }

    #[test]
    fn names_colliding_after_normalization_are_rejected() {
        let error = Settings::parse(
            "
caches:
    1:
        capacity: 3
    '1':
        capacity: 4
",
        )
        .unwrap_err();
        assert_eq!(error.to_string(), "Cache '1' is declared more than once.");

        let settings =
            Settings::parse("caches:\n    1:\n        capacity: 3\n    '2':\n        capacity: 4")
                .unwrap();
        assert_eq!(settings.cache("1").unwrap().capacity(), 3);
        assert_eq!(settings.cache("2").unwrap().capacity(), 4);
    }

    #[test]
    fn malformed_configs_keep_the_previous_settings() {
        let config = Config::new("test.yml");
        config
            .load_from_string("caches:\n    a:\n        capacity: 12")
            .unwrap();

        assert!(config.load_from_string("caches: 'invalid").is_err());
        assert!(config
            .load_from_string("caches:\n    a:\n        capacity: 0")
            .is_err());
        assert_eq!(config.current().cache("a").unwrap().capacity(), 12);
    }

    #[test]
    fn missing_files_are_reported() {
        let config = Config::new("/this/file/does/not/exist.yml");
        assert!(config.load().is_err());
        assert_eq!(config.current().caches().count(), 0);
    }

    #[test]
    fn reloading_adjusts_live_caches() {
        let config = Config::new("test.yml");
        config
            .load_from_string("caches:\n    a:\n        capacity: 8")
            .unwrap();

        let cache: LRUCache<i32, i32> = config.current().cache("a").unwrap().build().unwrap();
        for i in 0..8 {
            let _ = cache.put(i, i);
        }

        // Applying unchanged settings is a no-op...
        assert_eq!(config.current().cache("a").unwrap().apply(&cache), Ok(0));

        config
            .load_from_string("caches:\n    a:\n        capacity: 3")
            .unwrap();
        assert_eq!(config.current().cache("a").unwrap().apply(&cache), Ok(5));
        assert_eq!(cache.capacity(), 3);
        assert_eq!(cache.keys(), vec![5, 6, 7]);
    }
}
