use crate::index::{IndexKey, TitleIndex};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

pub struct CachedIndex {
    pub index: Arc<TitleIndex>,
    pub built_at: Instant,
    pub catalog_version: u64,
}

/// Read-through cache of built title indexes.
///
/// An entry is served only while the catalog reports the version it was
/// built from. Stale entries are replaced wholesale.
pub struct IndexCache {
    entries: RwLock<HashMap<IndexKey, CachedIndex>>,
    ttl: Option<Duration>,
    max_entries: usize,
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new(64)
    }
}

impl IndexCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: None,
            max_entries: max_entries.max(1),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Return the cached index if the catalog version matches and TTL not expired.
    pub fn get(&self, key: &IndexKey, catalog_version: u64) -> Option<Arc<TitleIndex>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).and_then(|e| {
            let fresh = self.ttl.map_or(true, |ttl| e.built_at.elapsed() < ttl);
            if e.catalog_version == catalog_version && fresh {
                Some(e.index.clone())
            } else {
                None
            }
        })
    }

    pub fn put(&self, key: IndexKey, index: Arc<TitleIndex>, catalog_version: u64) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.built_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CachedIndex {
                index,
                built_at: Instant::now(),
                catalog_version,
            },
        );
    }

    pub fn invalidate(&self, key: &IndexKey) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
