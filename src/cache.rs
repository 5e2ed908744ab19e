// 🧠 Memo Cache - explicit memoization keyed by (function, argument fingerprint)
//
// Replaces an implicit process-wide cache decorator. The owner decides when
// entries go stale: `invalidate` drops one function's results, `clear` drops
// everything. Nothing expires on its own.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CacheKey {
    pub function: &'static str,
    /// SHA-256 of the JSON-serialized arguments
    pub fingerprint: String,
}

impl CacheKey {
    pub fn new<A: Serialize + ?Sized>(function: &'static str, args: &A) -> Result<Self> {
        let bytes = serde_json::to_vec(args)
            .with_context(|| format!("Failed to fingerprint arguments for {}", function))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);

        Ok(Self {
            function,
            fingerprint: format!("{:x}", hasher.finalize()),
        })
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    cached_at: DateTime<Utc>,
    hits: u64,
}

/// What the cache currently holds (served by the cache endpoint)
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryInfo {
    pub function: &'static str,
    pub fingerprint: String,
    pub cached_at: DateTime<Utc>,
    pub hits: u64,
}

#[derive(Default)]
pub struct MemoCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, or run `compute` and remember it.
    ///
    /// Errors from `compute` are returned and not cached, so the next call
    /// tries again.
    pub fn get_or_try_insert_with<T, E, F>(&self, key: CacheKey, compute: F) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.lookup::<T>(&key) {
            debug!(function = key.function, "cache hit");
            return Ok(value);
        }

        debug!(function = key.function, "cache miss");
        let value = Arc::new(compute()?);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key,
            CacheEntry {
                value: value.clone(),
                cached_at: Utc::now(),
                hits: 0,
            },
        );

        Ok(value)
    }

    fn lookup<T: Send + Sync + 'static>(&self, key: &CacheKey) -> Option<Arc<T>> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get_mut(key)?;

        // Same key, different type: treat as a miss and let the insert replace it
        let value = entry.value.clone().downcast::<T>().ok()?;
        entry.hits += 1;
        Some(value)
    }

    /// Drop every entry computed by `function`; returns how many were removed
    pub fn invalidate(&self, function: &str) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|key, _| key.function != function);
        before - entries.len()
    }

    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let removed = entries.len();
        entries.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<CacheEntryInfo> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut infos: Vec<CacheEntryInfo> = entries
            .iter()
            .map(|(key, entry)| CacheEntryInfo {
                function: key.function,
                fingerprint: key.fingerprint.clone(),
                cached_at: entry.cached_at,
                hits: entry.hits,
            })
            .collect();

        infos.sort_by(|a, b| a.function.cmp(b.function).then(a.cached_at.cmp(&b.cached_at)));
        infos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::convert::Infallible;

    #[test]
    fn test_key_depends_on_arguments() {
        let a = CacheKey::new("shape_table", &("interactions", "abc")).unwrap();
        let b = CacheKey::new("shape_table", &("interactions", "abc")).unwrap();
        let c = CacheKey::new("shape_table", &("out_migration", "abc")).unwrap();
        let d = CacheKey::new("regional", &("interactions", "abc")).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a.fingerprint, c.fingerprint);
        assert_ne!(a, d);
    }

    #[test]
    fn test_second_call_is_served_from_cache() {
        let cache = MemoCache::new();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Ok::<_, Infallible>(vec![1, 2, 3])
        };

        let key = CacheKey::new("numbers", &1).unwrap();
        let first = cache.get_or_try_insert_with(key.clone(), compute).unwrap();
        let second = cache.get_or_try_insert_with(key, compute).unwrap();

        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.entries()[0].hits, 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = MemoCache::new();
        let key = CacheKey::new("flaky", &()).unwrap();

        let failed: Result<Arc<u32>, &str> =
            cache.get_or_try_insert_with(key.clone(), || Err("disk on fire"));
        assert!(failed.is_err());
        assert!(cache.is_empty());

        let ok: Result<Arc<u32>, &str> = cache.get_or_try_insert_with(key, || Ok(7));
        assert_eq!(*ok.unwrap(), 7);
    }

    #[test]
    fn test_invalidate_one_function() {
        let cache = MemoCache::new();
        for n in 0..3 {
            let key = CacheKey::new("shape_table", &n).unwrap();
            cache
                .get_or_try_insert_with(key, || Ok::<_, Infallible>(n))
                .unwrap();
        }
        let key = CacheKey::new("regional", &()).unwrap();
        cache
            .get_or_try_insert_with(key, || Ok::<_, Infallible>("rows"))
            .unwrap();

        assert_eq!(cache.invalidate("shape_table"), 3);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.clear(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_type_mismatch_recomputes() {
        let cache = MemoCache::new();
        let key = CacheKey::new("shared", &()).unwrap();

        cache
            .get_or_try_insert_with(key.clone(), || Ok::<_, Infallible>(1u32))
            .unwrap();
        let text = cache
            .get_or_try_insert_with(key, || Ok::<_, Infallible>("one".to_string()))
            .unwrap();

        assert_eq!(*text, "one");
        assert_eq!(cache.len(), 1);
    }
}
