use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::in_flight::{FlightResult, InFlight};
use crate::error::ResolveError;
use crate::models::{ContentId, StreamDescriptor};

/// Default retention window (5 hours).
const DEFAULT_RETENTION: Duration = Duration::from_secs(5 * 60 * 60);

/// Default sweep ceiling.
const DEFAULT_MAX_ENTRIES: usize = 100;

#[derive(Debug, Clone)]
pub struct StreamCacheConfig {
    /// Maximum age at which an entry is still served
    pub retention: Duration,
    /// Entry count above which an insertion sweeps expired entries
    pub max_entries: usize,
}

impl Default for StreamCacheConfig {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    descriptor: StreamDescriptor,
    created_at: Instant,
}

impl CacheEntry {
    fn new(descriptor: StreamDescriptor) -> Self {
        Self {
            descriptor,
            created_at: Instant::now(),
        }
    }

    fn is_expired(&self, retention: Duration) -> bool {
        self.created_at.elapsed() >= retention
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    resolutions: AtomicU64,
    sweeps: AtomicU64,
    expired_removals: AtomicU64,
}

/// Snapshot of cache activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub in_flight: usize,
    pub hits: u64,
    pub misses: u64,
    pub resolutions: u64,
    pub sweeps: u64,
    pub expired_removals: u64,
}

/// Time-bounded, size-bounded cache of resolved streams with single-flight
/// resolution.
///
/// Cheap to clone; clones share the same state.
#[derive(Debug, Clone)]
pub struct StreamCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    in_flight: Arc<DashMap<String, Arc<InFlight>>>,
    counters: Arc<Counters>,
    config: StreamCacheConfig,
}

impl StreamCache {
    pub fn new(config: StreamCacheConfig) -> Self {
        info!(
            "🗄️ Caché de streams iniciado: retención {}, techo {} entradas",
            humantime::format_duration(config.retention),
            config.max_entries
        );

        Self {
            entries: Arc::new(DashMap::new()),
            in_flight: Arc::new(DashMap::new()),
            counters: Arc::new(Counters::default()),
            config,
        }
    }

    /// Fresh descriptor for `content_id`, or `None` when absent or expired.
    pub fn get(&self, content_id: &ContentId) -> Option<StreamDescriptor> {
        match self.lookup(content_id.as_str()) {
            Some(descriptor) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!("✅ Cache hit para stream: {}", content_id);
                Some(descriptor)
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!("❌ Cache miss para stream: {}", content_id);
                None
            }
        }
    }

    /// Store `descriptor`, replacing any previous entry for the same ID.
    pub fn insert(&self, content_id: &ContentId, descriptor: StreamDescriptor) {
        self.entries
            .insert(content_id.to_string(), CacheEntry::new(descriptor));
        debug!("💾 Stream almacenado en caché: {}", content_id);

        if self.entries.len() > self.config.max_entries {
            self.sweep_expired();
        }
    }

    /// Return the cached descriptor, or run `resolve` under single-flight.
    ///
    /// Concurrent callers for the same ID share one `resolve` invocation and
    /// receive the same outcome. Only successes are stored. The resolution runs
    /// on its own task, so dropping any caller (the first one included) leaves
    /// it running for the others.
    pub async fn get_or_resolve<F, Fut>(
        &self,
        content_id: &ContentId,
        resolve: F,
    ) -> Result<StreamDescriptor, ResolveError>
    where
        F: FnOnce(ContentId) -> Fut + Send + 'static,
        Fut: Future<Output = Result<StreamDescriptor, ResolveError>> + Send + 'static,
    {
        if let Some(descriptor) = self.get(content_id) {
            return Ok(descriptor);
        }

        self.resolve_shared(content_id, resolve).wait().await
    }

    /// Join the flight for `content_id`, starting it if there is none.
    fn resolve_shared<F, Fut>(&self, content_id: &ContentId, resolve: F) -> Arc<InFlight>
    where
        F: FnOnce(ContentId) -> Fut + Send + 'static,
        Fut: Future<Output = Result<StreamDescriptor, ResolveError>> + Send + 'static,
    {
        let (flight, is_leader) = self.join_or_lead(content_id.as_str());

        if !is_leader {
            debug!("⏳ Esperando resolución en curso para: {}", content_id);
            return flight;
        }

        let guard = FlightGuard::new(self.clone(), content_id.to_string(), flight.clone());

        // A flight that finished between the miss and our registration already stored its result.
        if let Some(descriptor) = self.lookup(content_id.as_str()) {
            guard.finish(Ok(descriptor));
            return flight;
        }

        self.counters.resolutions.fetch_add(1, Ordering::Relaxed);

        let cache = self.clone();
        let content_id = content_id.clone();
        tokio::spawn(async move {
            let result = resolve(content_id.clone()).await;

            if let Ok(descriptor) = &result {
                cache.insert(&content_id, descriptor.clone());
            }

            guard.finish(result);
        });

        flight
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let before = self.entries.len();
        let retention = self.config.retention;
        self.entries.retain(|_, entry| !entry.is_expired(retention));
        let removed = before.saturating_sub(self.entries.len());

        self.counters.sweeps.fetch_add(1, Ordering::Relaxed);
        self.counters
            .expired_removals
            .fetch_add(removed as u64, Ordering::Relaxed);

        if removed > 0 {
            info!("🧹 Cache cleanup: removed {} expired streams", removed);
        }

        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            in_flight: self.in_flight.len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            resolutions: self.counters.resolutions.load(Ordering::Relaxed),
            sweeps: self.counters.sweeps.load(Ordering::Relaxed),
            expired_removals: self.counters.expired_removals.load(Ordering::Relaxed),
        }
    }

    /// Fresh lookup without touching the hit/miss counters.
    fn lookup(&self, key: &str) -> Option<StreamDescriptor> {
        let retention = self.config.retention;

        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(retention) => {
                return Some(entry.descriptor.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            // Only drop it if nobody refreshed the entry since we looked.
            if self
                .entries
                .remove_if(key, |_, entry| entry.is_expired(retention))
                .is_some()
            {
                self.counters.expired_removals.fetch_add(1, Ordering::Relaxed);
            }
        }

        None
    }

    fn join_or_lead(&self, key: &str) -> (Arc<InFlight>, bool) {
        match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let flight = Arc::new(InFlight::new());
                entry.insert(flight.clone());
                (flight, true)
            }
        }
    }

    /// Free the slot, then wake the waiters.
    fn release(&self, key: &str, flight: &Arc<InFlight>, result: FlightResult) {
        self.in_flight
            .remove_if(key, |_, current| Arc::ptr_eq(current, flight));
        flight.complete(result);
    }
}

/// Owned by the task running a resolution.
///
/// Dropping it without [`FlightGuard::finish`] (the task panicked or the
/// runtime shut down) releases the slot and fails every waiter.
struct FlightGuard {
    cache: StreamCache,
    key: String,
    flight: Arc<InFlight>,
    finished: bool,
}

impl FlightGuard {
    fn new(cache: StreamCache, key: String, flight: Arc<InFlight>) -> Self {
        Self {
            cache,
            key,
            flight,
            finished: false,
        }
    }

    fn finish(mut self, result: FlightResult) {
        self.finished = true;
        self.cache.release(&self.key, &self.flight, result);
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if !self.finished {
            warn!("🛑 Resolución abortada para: {}", self.key);
            self.cache.release(
                &self.key,
                &self.flight,
                Err(ResolveError::ExtractionFailed(
                    "resolution aborted".to_string(),
                )),
            );
        }
    }
}
