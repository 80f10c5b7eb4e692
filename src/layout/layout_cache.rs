use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use xxhash_rust::xxh3::xxh3_64;

use crate::layout::{GalleryLayout, JustifiedLayout};
use crate::models::AssetRecord;

/// Maximum number of cached layouts to keep in memory.
const MAX_CACHE_ENTRIES: usize = 8;

/// Key for the layout cache.
///
/// Unlike a scroll view a gallery must be pixel exact, so the container width
/// is part of the key as a whole pixel count rather than a bucket.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    container_width: u32,
    params: [u64; 5],
    list_hash: u64,
}

/// Memoizes justified layouts for the asset lists a gallery renders.
///
/// Appending a page or resizing the window invalidates naturally: the key
/// changes and the previous entries age out of the LRU.
pub struct LayoutCache {
    cache: Mutex<LruCache<CacheKey, Arc<GalleryLayout>>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::with_capacity(MAX_CACHE_ENTRIES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Computes a fast hash of the asset list.
    /// The hash is based on (identity + dimensions) for each item in order,
    /// so any append, reorder or size change produces a new key.
    pub fn compute_list_hash(items: &[AssetRecord]) -> u64 {
        let mut hasher_input = Vec::with_capacity(items.len() * 48);

        for item in items {
            hasher_input.extend_from_slice(item.identity.as_bytes());
            hasher_input.push(0);
            hasher_input.extend_from_slice(&item.width.to_le_bytes());
            hasher_input.extend_from_slice(&item.height.to_le_bytes());
        }

        xxh3_64(&hasher_input)
    }

    /// Returns the layout for `items`, computing and storing it on a miss.
    pub fn get_or_compute(
        &self,
        layout: &JustifiedLayout,
        items: &[AssetRecord],
        container_width: f64,
    ) -> Arc<GalleryLayout> {
        if items.is_empty() || !(container_width > 0.0) {
            return Arc::new(GalleryLayout::default());
        }

        let key = CacheKey {
            container_width: container_width.floor() as u32,
            params: layout.fingerprint(),
            list_hash: Self::compute_list_hash(items),
        };

        if let Some(hit) = self.cache.lock().get(&key) {
            return Arc::clone(hit);
        }

        let computed = Arc::new(layout.compute(items, container_width));
        self.cache.lock().put(key, Arc::clone(&computed));
        computed
    }

    /// Clears the entire cache.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    /// Returns the number of cached layouts.
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}
