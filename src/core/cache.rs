//! In-memory TTL cache.
//!
//! [`TtlCache`] stores type-erased values under string keys. Expiry is checked on every
//! read, so an expired entry is never returned even if the background sweep has not yet
//! removed it; the sweep only bounds memory. A process-wide instance is available through
//! [`global`] and the `*_global` helpers.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// A cached value.
pub type CacheValue = Arc<dyn Any + Send + Sync>;

/// Entry lifetime used by [`TtlCache::set`] unless configured otherwise.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// How often the background task removes expired entries.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

// Deadline used when `now + ttl` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// `now + ttl`, saturating to a far-future deadline instead of overflowing.
pub(crate) fn deadline_after(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

struct Entry {
    value: CacheValue,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

#[derive(Default)]
struct Store {
    map: RwLock<HashMap<String, Entry>>,
}

impl Store {
    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut map = self.map.write().await;
        let before = map.len();
        map.retain(|_, e| !e.is_expired(now));
        before - map.len()
    }
}

enum Sweeper {
    // Runs on the runtime the cache was created in.
    Task(JoinHandle<()>),
    // Owns a current-thread runtime, so it outlives whichever runtime touched the cache.
    Thread(thread::JoinHandle<()>),
}

impl Sweeper {
    fn is_finished(&self) -> bool {
        match self {
            Sweeper::Task(h) => h.is_finished(),
            Sweeper::Thread(h) => h.is_finished(),
        }
    }
}

/// Thread-safe key/value store whose entries expire.
///
/// Must be created inside a Tokio runtime for the background sweep to run; outside one the
/// cache still works, expired entries are just only dropped by [`purge_expired`](Self::purge_expired),
/// [`delete`](Self::delete) or [`clear`](Self::clear).
pub struct TtlCache {
    store: Arc<Store>,
    default_ttl: Duration,
    shutdown: Option<oneshot::Sender<()>>,
    sweeper: Option<Sweeper>,
}

impl fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("default_ttl", &self.default_ttl)
            .field("sweeping", &self.is_sweeping())
            .finish_non_exhaustive()
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl TtlCache {
    /// A cache whose entries live for `default_ttl`, swept every [`DEFAULT_SWEEP_INTERVAL`].
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_sweep_interval(default_ttl, DEFAULT_SWEEP_INTERVAL)
    }

    /// A cache swept every `sweep_every`.
    pub fn with_sweep_interval(default_ttl: Duration, sweep_every: Duration) -> Self {
        let store = Arc::new(Store::default());
        let (tx, rx) = oneshot::channel();

        let sweeper = match tokio::runtime::Handle::try_current() {
            Ok(handle) => Some(Sweeper::Task(handle.spawn(sweep_loop(
                Arc::downgrade(&store),
                sweep_every.max(Duration::from_millis(1)),
                rx,
            )))),
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("no tokio runtime; TTL cache created without background sweep");
                None
            }
        };

        Self {
            store,
            default_ttl,
            shutdown: Some(tx),
            sweeper,
        }
    }

    /// A cache whose sweep runs on a dedicated thread with its own runtime, independent of
    /// the caller's runtime. Falls back to no sweep if that thread cannot be started.
    pub(crate) fn with_sweep_thread(default_ttl: Duration, sweep_every: Duration) -> Self {
        let store = Arc::new(Store::default());
        let (tx, rx) = oneshot::channel();
        let weak = Arc::downgrade(&store);
        let every = sweep_every.max(Duration::from_millis(1));

        let sweeper = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .and_then(|rt| {
                thread::Builder::new()
                    .name("ttl-cache-sweep".into())
                    .spawn(move || rt.block_on(sweep_loop(weak, every, rx)))
            });
        let sweeper = match sweeper {
            Ok(handle) => Some(Sweeper::Thread(handle)),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_e, "could not start TTL cache sweep thread");
                None
            }
        };

        Self {
            store,
            default_ttl,
            shutdown: Some(tx),
            sweeper,
        }
    }

    /// The lifetime given to entries stored with [`set`](Self::set).
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// `true` while the background sweep task is running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.as_ref().is_some_and(|s| !s.is_finished())
    }

    /// Store `value` for the default TTL.
    pub async fn set<V: Any + Send + Sync>(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl).await;
    }

    /// Store `value` for `ttl`.
    pub async fn set_with_ttl<V: Any + Send + Sync>(
        &self,
        key: impl Into<String>,
        value: V,
        ttl: Duration,
    ) {
        let entry = Entry {
            value: Arc::new(value),
            expires_at: deadline_after(Instant::now(), ttl),
        };
        self.store.map.write().await.insert(key.into(), entry);
    }

    /// The value under `key`, unless it is missing or expired.
    pub async fn get(&self, key: &str) -> Option<CacheValue> {
        let map = self.store.map.read().await;
        match map.get(key) {
            Some(e) if !e.is_expired(Instant::now()) => Some(Arc::clone(&e.value)),
            _ => None,
        }
    }

    /// The value under `key` if it is a `T`.
    pub async fn get_as<T: Any + Clone>(&self, key: &str) -> Option<T> {
        self.get(key).await?.downcast_ref::<T>().cloned()
    }

    /// The value under `key` if it is a `String` or `&'static str`.
    pub async fn get_string(&self, key: &str) -> Option<String> {
        let value = self.get(key).await?;
        if let Some(s) = value.downcast_ref::<String>() {
            return Some(s.clone());
        }
        value.downcast_ref::<&'static str>().map(|s| (*s).to_string())
    }

    /// Remove `key`. Returns whether an entry (expired or not) was present.
    pub async fn delete(&self, key: &str) -> bool {
        self.store.map.write().await.remove(key).is_some()
    }

    /// Remove every entry.
    pub async fn clear(&self) {
        self.store.map.write().await.clear();
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.store.map.read().await.len()
    }

    /// `true` if no entries are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove expired entries now. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.store.purge_expired().await
    }

    /// Stop the background sweep. Entries already stored are dropped with the cache.
    pub fn close(mut self) {
        self.stop_sweeper();
    }

    fn stop_sweeper(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.sweeper = None;
    }
}

impl Drop for TtlCache {
    fn drop(&mut self) {
        self.stop_sweeper();
    }
}

async fn sweep_loop(store: Weak<Store>, every: Duration, mut shutdown: oneshot::Receiver<()>) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let Some(store) = store.upgrade() else { break };
                let _removed = store.purge_expired().await;

                #[cfg(feature = "tracing")]
                {
                    if _removed > 0 {
                        tracing::debug!(removed = _removed, "swept expired cache entries");
                    }
                }
            }
        }
    }
}

/* ---------------- process-wide instance ---------------- */

static GLOBAL: OnceLock<TtlCache> = OnceLock::new();

/// The shared cache, created with default settings on first use.
///
/// Its sweep runs on its own thread, so it keeps going after the runtime that first
/// touched the cache has shut down.
pub fn global() -> &'static TtlCache {
    GLOBAL.get_or_init(|| TtlCache::with_sweep_thread(DEFAULT_TTL, DEFAULT_SWEEP_INTERVAL))
}

/// [`TtlCache::set`] on the [`global`] cache.
pub async fn set_global<V: Any + Send + Sync>(key: impl Into<String>, value: V) {
    global().set(key, value).await;
}

/// [`TtlCache::get`] on the [`global`] cache.
pub async fn get_global(key: &str) -> Option<CacheValue> {
    global().get(key).await
}

/// [`TtlCache::delete`] on the [`global`] cache.
pub async fn delete_global(key: &str) -> bool {
    global().delete(key).await
}

/// [`TtlCache::clear`] on the [`global`] cache.
pub async fn clear_global() {
    global().clear().await;
}
