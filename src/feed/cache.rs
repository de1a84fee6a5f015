use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Storage for previously fetched feed documents.
///
/// The fetcher consults the provider before every network call and stores
/// each fresh document in it. Implementations decide how long to keep
/// documents; the fetcher decides how old a document may be.
pub trait CacheProvider: Send + Sync {
    /// Returns the document stored for `url` if it is at most `max_age` old.
    fn get(&self, url: &str, max_age: Duration) -> Option<Vec<u8>>;

    /// Stores a freshly fetched document for `url`.
    fn put(&self, url: &str, document: Vec<u8>);
}

/// A provider that never stores anything. Every fetch goes to the network.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl CacheProvider for NoCache {
    fn get(&self, _url: &str, _max_age: Duration) -> Option<Vec<u8>> {
        None
    }

    fn put(&self, _url: &str, _document: Vec<u8>) {}
}

struct CachedDocument {
    body: Vec<u8>,
    fetched_at: Instant,
}

/// In-process LRU cache of feed documents keyed by URL.
///
/// Uses `tokio::time::Instant`, so paused-time tests can age entries with
/// `tokio::time::advance`.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, CachedDocument>>,
}

impl MemoryCache {
    /// Creates a cache holding at most `capacity` documents (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of documents currently stored, stale or not.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheProvider for MemoryCache {
    fn get(&self, url: &str, max_age: Duration) -> Option<Vec<u8>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let fresh = entries
            .get(url)
            .map(|doc| doc.fetched_at.elapsed() <= max_age)?;

        if fresh {
            entries.get(url).map(|doc| doc.body.clone())
        } else {
            // Stale documents are never served again
            entries.pop(url);
            None
        }
    }

    fn put(&self, url: &str, document: Vec<u8>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.put(
            url.to_string(),
            CachedDocument {
                body: document,
                fetched_at: Instant::now(),
            },
        );
    }
}
