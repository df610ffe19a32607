//! Short-TTL cache with explicit invalidation.
//!
//! One instance per cached resource (company info, prompt text). The cache
//! has no knowledge of writes: every code path that mutates the underlying
//! resource must call [`TtlCache::invalidate`].

use std::future::Future;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

struct Entry<T> {
    data: T,
    stored_at: Instant,
}

/// Single-slot cache holding one value for a fixed TTL.
///
/// Reads within the TTL return the cached value without touching the loader.
/// After expiry the loader runs again; if it fails and an expired value is
/// still around, the stale value is served as a fallback (availability over
/// freshness) and a warning is logged.
pub struct TtlCache<T> {
    ttl: Duration,
    slot: RwLock<Option<Entry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    /// Create a cache with the given time-to-live.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Return the cached value, loading it through `loader` when missing or
    /// expired.
    ///
    /// # Errors
    ///
    /// Propagates the loader error only when no previously cached value is
    /// available to fall back on.
    pub async fn get_or_load<F, Fut, E>(&self, loader: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        {
            let slot = self.slot.read().await;
            if let Some(entry) = slot.as_ref()
                && entry.stored_at.elapsed() < self.ttl
            {
                debug!("cache hit");
                return Ok(entry.data.clone());
            }
        }

        match loader().await {
            Ok(data) => {
                let mut slot = self.slot.write().await;
                *slot = Some(Entry {
                    data: data.clone(),
                    stored_at: Instant::now(),
                });
                Ok(data)
            }
            Err(err) => {
                // Serve the expired entry rather than failing the caller.
                let slot = self.slot.read().await;
                if let Some(entry) = slot.as_ref() {
                    warn!(error = %err, "cache reload failed, serving stale value");
                    return Ok(entry.data.clone());
                }
                Err(err)
            }
        }
    }

    /// Discard the cached entry entirely so the next read reloads from the
    /// source of truth.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    const TTL: Duration = Duration::from_secs(300);

    fn counting_loader(
        calls: Arc<AtomicU32>,
        value: &'static str,
    ) -> impl FnOnce() -> std::future::Ready<Result<String, String>> {
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(value.to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn loader_runs_once_within_ttl() {
        let cache = TtlCache::new(TTL);
        let calls = Arc::new(AtomicU32::new(0));

        let first = cache
            .get_or_load(counting_loader(calls.clone(), "a"))
            .await
            .expect("load");
        let second = cache
            .get_or_load(counting_loader(calls.clone(), "b"))
            .await
            .expect("load");

        assert_eq!(first, "a");
        assert_eq!(second, "a");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn loader_runs_again_after_expiry() {
        let cache = TtlCache::new(TTL);
        let calls = Arc::new(AtomicU32::new(0));

        cache
            .get_or_load(counting_loader(calls.clone(), "a"))
            .await
            .expect("load");
        tokio::time::advance(TTL + Duration::from_millis(1)).await;
        let value = cache
            .get_or_load(counting_loader(calls.clone(), "b"))
            .await
            .expect("load");

        assert_eq!(value, "b");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_value_served_when_reload_fails() {
        let cache = TtlCache::new(TTL);

        cache
            .get_or_load(|| std::future::ready(Ok::<_, String>("fresh".to_string())))
            .await
            .expect("load");
        tokio::time::advance(TTL + Duration::from_millis(1)).await;

        let value = cache
            .get_or_load(|| std::future::ready(Err::<String, _>("db down".to_string())))
            .await
            .expect("stale fallback");
        assert_eq!(value, "fresh");
    }

    #[tokio::test(start_paused = true)]
    async fn error_propagates_when_nothing_cached() {
        let cache: TtlCache<String> = TtlCache::new(TTL);

        let result = cache
            .get_or_load(|| std::future::ready(Err::<String, _>("db down".to_string())))
            .await;
        assert_eq!(result, Err("db down".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_reload() {
        let cache = TtlCache::new(TTL);
        let calls = Arc::new(AtomicU32::new(0));

        cache
            .get_or_load(counting_loader(calls.clone(), "a"))
            .await
            .expect("load");
        cache.invalidate().await;
        let value = cache
            .get_or_load(counting_loader(calls.clone(), "b"))
            .await
            .expect("load");

        assert_eq!(value, "b");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_discards_stale_fallback() {
        let cache = TtlCache::new(TTL);

        cache
            .get_or_load(|| std::future::ready(Ok::<_, String>("fresh".to_string())))
            .await
            .expect("load");
        cache.invalidate().await;

        // The entry is gone entirely, so a failing loader has nothing to
        // fall back on.
        let result = cache
            .get_or_load(|| std::future::ready(Err::<String, _>("db down".to_string())))
            .await;
        assert!(result.is_err());
    }
}
