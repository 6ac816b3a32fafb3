//! Keyed store of the last-known value of each read query.
//!
//! The cache is advisory: it is never a source of truth for quota. Entries
//! change only when a read completes or when a mutation invalidates them;
//! there is no time-based expiry.
//!
//! Each key carries a generation number that [`QueryCache::invalidate`] bumps.
//! A fetch remembers the generation it started under and only stores its
//! result if the generation is unchanged when it completes. A read that was
//! already in flight when a commit invalidated its key therefore cannot put
//! pre-commit data back into the cache. A fetch whose future is dropped never
//! writes at all.
//!
//! # Example
//!
//! ```rust
//! use festival_runtime::cache::{QueryCache, QueryKey};
//!
//! # async fn example() -> Result<(), std::io::Error> {
//! let cache = QueryCache::new();
//! let key = QueryKey::new(["lineup", "artists", "top"]).param("limit", 6);
//!
//! let first = cache.get_or_fetch(&key, || async { Ok::<_, std::io::Error>(vec!["Nova"]) }).await?;
//! let second = cache.get_or_fetch(&key, || async { Ok::<_, std::io::Error>(vec!["never fetched"]) }).await?;
//! assert_eq!(first, second);
//!
//! cache.invalidate(&key).await;
//! assert!(!cache.contains(&key).await);
//! # Ok(())
//! # }
//! ```

use crate::metrics::CacheMetrics;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Identity of a read query: resource segments plus normalised parameters.
///
/// Parameters are kept sorted, so insertion order does not affect equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey {
    segments: Vec<String>,
    params: BTreeMap<String, String>,
}

impl QueryKey {
    /// Create a key from resource segments, e.g. `["tickets", "on-sale"]`.
    #[must_use]
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Resource segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether `self` falls under `prefix`.
    ///
    /// `prefix`'s segments must lead `self`'s, and every parameter of `prefix`
    /// must be present with the same value.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.segments.starts_with(&prefix.segments)
            && prefix
                .params
                .iter()
                .all(|(k, v)| self.params.get(k) == Some(v))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))?;
        for (i, (k, v)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{k}={v}")?;
        }
        Ok(())
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, CacheEntry>,
    generations: HashMap<QueryKey, u64>,
}

impl CacheState {
    fn bump(&mut self, key: &QueryKey) {
        *self.generations.entry(key.clone()).or_insert(0) += 1;
    }
}

/// Shared query cache.
///
/// Values of different types share one cache; reading a key with a type other
/// than the one stored is treated as a miss.
#[derive(Default)]
pub struct QueryCache {
    state: RwLock<CacheState>,
}

impl QueryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, or fetch, store and return it.
    ///
    /// The lock is not held while `fetcher` runs. Fetch errors are returned
    /// as-is and nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns whatever error `fetcher` produced.
    pub async fn get_or_fetch<V, E, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<Arc<V>, E>
    where
        V: Any + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get::<V>(key).await {
            CacheMetrics::record_hit();
            tracing::trace!(key = %key, "Query cache hit");
            return Ok(value);
        }

        CacheMetrics::record_miss();
        tracing::debug!(key = %key, "Query cache miss, fetching");

        let generation = {
            let mut state = self.state.write().await;
            *state.generations.entry(key.clone()).or_insert(0)
        };

        let value = Arc::new(fetcher().await?);

        let mut state = self.state.write().await;
        if state.generations.get(key).copied().unwrap_or(0) == generation {
            let erased: Arc<dyn Any + Send + Sync> = value.clone();
            state.entries.insert(key.clone(), CacheEntry { value: erased });
        } else {
            CacheMetrics::record_stale_write_discarded();
            tracing::debug!(key = %key, "Key invalidated during fetch, result not cached");
        }

        Ok(value)
    }

    /// Cached value for `key`, if present and of type `V`.
    pub async fn get<V>(&self, key: &QueryKey) -> Option<Arc<V>>
    where
        V: Any + Send + Sync,
    {
        let state = self.state.read().await;
        let entry = state.entries.get(key)?;
        Arc::clone(&entry.value).downcast::<V>().ok()
    }

    /// Remove the entry for `key` so the next read refetches.
    ///
    /// Returns `true` if an entry was removed.
    pub async fn invalidate(&self, key: &QueryKey) -> bool {
        let mut state = self.state.write().await;
        state.bump(key);
        let removed = state.entries.remove(key).is_some();
        CacheMetrics::record_invalidations(usize::from(removed));
        tracing::debug!(key = %key, removed, "Query cache key invalidated");
        removed
    }

    /// Remove every entry under `prefix`.
    ///
    /// Returns the number of entries removed.
    pub async fn invalidate_prefix(&self, prefix: &QueryKey) -> usize {
        let mut state = self.state.write().await;

        let matching: Vec<QueryKey> = state
            .generations
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        for key in &matching {
            state.bump(key);
        }

        let before = state.entries.len();
        state.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - state.entries.len();

        CacheMetrics::record_invalidations(removed);
        tracing::debug!(prefix = %prefix, removed, "Query cache prefix invalidated");
        removed
    }

    /// Remove every entry.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        for generation in state.generations.values_mut() {
            *generation += 1;
        }
        let removed = state.entries.len();
        state.entries.clear();
        CacheMetrics::record_invalidations(removed);
    }

    /// Whether an entry exists for `key`.
    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.state.read().await.entries.contains_key(key)
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache").finish_non_exhaustive()
    }
}
