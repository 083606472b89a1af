use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for linker observability. Shared across threads.
#[derive(Debug, Default)]
pub struct LinkerMetrics {
    rewrites: AtomicU64,
    substitutions: AtomicU64,
    index_builds: AtomicU64,
    cache_hits: AtomicU64,
    catalog_failures: AtomicU64,
    empty_catalogs: AtomicU64,
    attributes_skipped: AtomicU64,
    fallbacks: AtomicU64,
}

/// Point-in-time copy of [`LinkerMetrics`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Texts rewritten (including ones left unchanged).
    pub rewrites: u64,

    /// Links emitted across all rewrites.
    pub substitutions: u64,

    /// Title indexes built from the catalog.
    pub index_builds: u64,

    /// Title indexes served from cache.
    pub cache_hits: u64,

    /// Catalog queries that failed.
    pub catalog_failures: u64,

    /// Catalog queries that returned no pages.
    pub empty_catalogs: u64,

    /// Attribute lines skipped as malformed or duplicate.
    pub attributes_skipped: u64,

    /// Rewrites that fell back to the original text after an error.
    pub fallbacks: u64,
}

impl LinkerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_rewrite(&self, substitutions: usize) {
        self.rewrites.fetch_add(1, Ordering::Relaxed);
        self.substitutions
            .fetch_add(substitutions as u64, Ordering::Relaxed);
    }

    pub fn record_index_build(&self) {
        self.index_builds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_catalog_failure(&self) {
        self.catalog_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_empty_catalog(&self) {
        self.empty_catalogs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attributes_skipped(&self, count: usize) {
        self.attributes_skipped
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rewrites: self.rewrites.load(Ordering::Relaxed),
            substitutions: self.substitutions.load(Ordering::Relaxed),
            index_builds: self.index_builds.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            catalog_failures: self.catalog_failures.load(Ordering::Relaxed),
            empty_catalogs: self.empty_catalogs.load(Ordering::Relaxed),
            attributes_skipped: self.attributes_skipped.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSnapshot {
    /// Get a summary string for logging
    pub fn summary(&self) -> String {
        format!(
            "{} rewrites, {} links | index: {} builds, {} cache hits | \
             catalog: {} failures, {} empty | {} attribute lines skipped, {} fallbacks",
            self.rewrites,
            self.substitutions,
            self.index_builds,
            self.cache_hits,
            self.catalog_failures,
            self.empty_catalogs,
            self.attributes_skipped,
            self.fallbacks
        )
    }
}
