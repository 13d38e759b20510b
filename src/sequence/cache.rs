use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

use crate::foundation::config::MANIFEST_CACHE_CAPACITY;
use crate::foundation::error::FlipbookResult;
use crate::sequence::model::ResolvedSequence;

/// A manifest resolution that every caller for the same URL awaits together.
pub(crate) type SharedResolve = Shared<BoxFuture<'static, FlipbookResult<ResolvedSequence>>>;

/// Bounded memo of manifest resolutions keyed by manifest URL.
///
/// Holds both in-flight and settled results so concurrent callers share one fetch. When full,
/// the oldest inserted entry is evicted first (lookups do not refresh an entry). Failed
/// resolutions are removed by the resolver so a later call retries.
///
/// Cloning yields another handle to the same cache.
#[derive(Clone)]
pub struct ManifestCache {
    inner: Arc<Mutex<CacheInner>>,
}

struct CacheInner {
    capacity: usize,
    next_id: u64,
    order: VecDeque<String>,
    entries: HashMap<String, CacheEntry>,
}

struct CacheEntry {
    id: u64,
    result: SharedResolve,
}

impl Default for ManifestCache {
    fn default() -> Self {
        Self::new(MANIFEST_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for ManifestCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ManifestCache")
            .field("capacity", &inner.capacity)
            .field("len", &inner.entries.len())
            .finish()
    }
}

impl ManifestCache {
    /// Create an empty cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                capacity: capacity.max(1),
                next_id: 0,
                order: VecDeque::new(),
                entries: HashMap::new(),
            })),
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    /// Number of entries, pending or settled.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Return `true` when the cache has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return `true` when `url` has a pending or settled entry.
    pub fn contains(&self, url: &str) -> bool {
        self.inner.lock().entries.contains_key(url)
    }

    /// Cached URLs, oldest first.
    pub fn urls(&self) -> Vec<String> {
        self.inner.lock().order.iter().cloned().collect()
    }

    /// Drop every entry. Callers already awaiting a pending entry keep their handle.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    /// Return the entry for `url`, inserting the future built by `make` when absent.
    ///
    /// The returned id identifies this particular entry for [`ManifestCache::remove_entry`].
    pub(crate) fn get_or_insert_with(
        &self,
        url: &str,
        make: impl FnOnce() -> BoxFuture<'static, FlipbookResult<ResolvedSequence>>,
    ) -> (u64, SharedResolve) {
        use futures::FutureExt as _;

        let mut inner = self.inner.lock();
        if let Some(entry) = inner.entries.get(url) {
            tracing::trace!(url, "manifest cache hit");
            return (entry.id, entry.result.clone());
        }

        while inner.entries.len() >= inner.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            tracing::debug!(url = oldest.as_str(), "manifest cache evicted oldest entry");
        }

        let id = inner.next_id;
        inner.next_id = inner.next_id.wrapping_add(1);
        let result = make().shared();
        inner.order.push_back(url.to_owned());
        inner.entries.insert(
            url.to_owned(),
            CacheEntry {
                id,
                result: result.clone(),
            },
        );
        (id, result)
    }

    /// Remove the entry for `url` if it is still the one identified by `id`.
    pub(crate) fn remove_entry(&self, url: &str, id: u64) -> bool {
        let mut inner = self.inner.lock();
        if inner.entries.get(url).is_none_or(|e| e.id != id) {
            return false;
        }
        inner.entries.remove(url);
        inner.order.retain(|u| u != url);
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/cache.rs"]
mod tests;
