//! In-memory, time-bounded cache of OCR results.
//!
//! Entries are keyed by the hash of the rendered page image plus the OCR
//! options that influence recognition. The cache is owned by a pipeline
//! instance and shared with parallel OCR tasks through an `Arc`; a miss is
//! always safe, so expired entries may be dropped at any time.

use super::utils::{compute_bytes_hash, compute_hash};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Default time-to-live for cached OCR text.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
struct CacheEntry {
    text: String,
    inserted_at: Instant,
}

#[derive(Debug)]
pub struct OcrCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for OcrCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl OcrCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Build the cache key for an image and the serialized OCR configuration.
    pub fn cache_key(image: &[u8], backend: &str, config: &str) -> String {
        let cache_string = format!(
            "image_hash={}&ocr_backend={}&ocr_config={}",
            compute_bytes_hash(image),
            backend,
            config
        );

        compute_hash(&cache_string)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.text.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            // Another task may have refreshed the entry in between; only drop it if still stale.
            self.entries
                .remove_if(key, |_, entry| entry.inserted_at.elapsed() >= self.ttl);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, key: String, text: String) {
        self.entries.insert(
            key,
            CacheEntry {
                text,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop every entry older than the TTL. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> OcrCacheStats {
        OcrCacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OcrCacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}
