//! Persistent key-value store for the municipality catalog
//!
//! The store only deals in strings. Interpreting (and distrusting) the
//! stored JSON is up to the caller.

use crate::error::{Result, RuianError};
use chrono::{DateTime, Duration, Utc};
use ruian_types::Municipality;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Key-value store with full-overwrite, last-writer-wins semantics
pub trait CachePort: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Persisted catalog snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub timestamp: DateTime<Utc>,
    pub municipalities: Vec<Municipality>,
}

impl CatalogEntry {
    pub fn new(municipalities: Vec<Municipality>) -> Self {
        Self {
            timestamp: Utc::now(),
            municipalities,
        }
    }

    /// Whether the entry is still inside its retention window at `now`
    pub fn is_fresh_at(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        now < self.timestamp + retention
    }

    pub fn is_fresh(&self, retention: Duration) -> bool {
        self.is_fresh_at(Utc::now(), retention)
    }
}

/// In-process store, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CachePort for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key under a root directory
#[derive(Debug, Clone)]
pub struct FileCache {
    root_path: PathBuf,
}

impl FileCache {
    /// Create the store, making the directory if needed
    pub fn new<P: AsRef<Path>>(root_path: P) -> Result<Self> {
        let root_path = root_path.as_ref().to_path_buf();
        fs::create_dir_all(&root_path)?;

        Ok(Self { root_path })
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(RuianError::Cache(format!("Invalid cache key: {:?}", key)));
        }
        Ok(self.root_path.join(format!("{}.json", key)))
    }
}

impl CachePort for FileCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        // Readers never observe a partially written entry
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruian_types::{MunicipalityId, REGIONS};
    use tempfile::TempDir;

    #[test]
    fn test_ttl_boundary() {
        let written = Utc::now();
        let entry = CatalogEntry {
            timestamp: written,
            municipalities: Vec::new(),
        };
        let retention = Duration::hours(24);
        let epsilon = Duration::seconds(1);

        assert!(entry.is_fresh_at(written + retention - epsilon, retention));
        assert!(!entry.is_fresh_at(written + retention + epsilon, retention));
    }

    #[test]
    fn test_memory_cache_overwrites() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("k").unwrap(), None);

        cache.put("k", "one").unwrap();
        cache.put("k", "two").unwrap();
        assert_eq!(cache.get("k").unwrap().as_deref(), Some("two"));

        cache.remove("k").unwrap();
        assert_eq!(cache.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_cache_persists_entries() {
        let temp_dir = TempDir::new().unwrap();
        let entry = CatalogEntry::new(vec![Municipality::new(
            MunicipalityId::new(554782),
            "Praha",
            &REGIONS[0],
        )]);
        let json = serde_json::to_string(&entry).unwrap();

        {
            let cache = FileCache::new(temp_dir.path()).unwrap();
            cache.put("ruian_municipalities", &json).unwrap();
        }

        let cache = FileCache::new(temp_dir.path()).unwrap();
        let stored = cache.get("ruian_municipalities").unwrap().unwrap();
        let parsed: CatalogEntry = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed, entry);

        cache.remove("ruian_municipalities").unwrap();
        assert!(cache.get("ruian_municipalities").unwrap().is_none());
    }

    #[test]
    fn test_file_cache_rejects_path_keys() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path()).unwrap();

        assert!(cache.put("../escape", "x").is_err());
        assert!(cache.get("").is_err());
    }
}
