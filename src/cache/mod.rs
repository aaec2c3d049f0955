//! TTL cache for resolved profiles and roles
//!
//! A process-local key/value store with per-entry expiry. Entries are valid
//! while `now - stored_at < ttl`; expired entries are never returned and are
//! purged either lazily on read or by the [`CacheSweeper`] background task.
//!
//! Each cache is an explicit instance injected into the resolvers that use
//! it. Cloning a [`TtlCache`] yields another handle to the same storage.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

pub mod sweeper;

pub use sweeper::CacheSweeper;

/// Cache statistics for monitoring and debugging
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct CacheStats {
    /// Lookups that returned a live entry
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Current number of stored entries (live or not yet swept)
    pub entries: u64,
    /// Hit rate as percentage (0.0 - 100.0)
    pub hit_rate: f64,
    /// Entries dropped to make room for new keys
    pub evictions: u64,
    /// Entries removed because their TTL elapsed
    pub expired: u64,
}

impl CacheStats {
    /// Calculate hit rate from hits and misses
    pub fn calculate_hit_rate(hits: u64, misses: u64) -> f64 {
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

/// Configuration for a single cache instance
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an entry stays valid after it was stored
    pub ttl: Duration,
    /// Maximum number of entries before the oldest one is evicted
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300), // 5 minutes
            max_entries: 10_000,
        }
    }
}

#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, stored_at: Instant) -> Self {
        Self { value, stored_at }
    }

    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) >= ttl
    }
}

type Entries<V> = HashMap<String, CacheEntry<V>>;

/// Counters kept outside the entry lock so lookups only need a read lock
#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    evictions: AtomicU64,
}

enum Lookup<V> {
    Hit(V),
    Expired,
    Missing,
}

/// Generic string-keyed cache with per-entry TTL
///
/// All operations are total: none of them fail. Reads that race with the
/// sweep observe either the entry or its absence, never a partial value.
///
/// ```rust
/// use std::time::Duration;
/// use profile_authz::cache::{CacheConfig, TtlCache};
///
/// # #[tokio::main]
/// # async fn main() {
/// let cache: TtlCache<String> = TtlCache::new("roles", CacheConfig {
///     ttl: Duration::from_secs(60),
///     max_entries: 100,
/// });
///
/// cache.set("user-1", "admin".to_string()).await;
/// assert_eq!(cache.get("user-1").await.as_deref(), Some("admin"));
///
/// cache.invalidate("user-1").await;
/// assert!(cache.get("user-1").await.is_none());
/// # }
/// ```
#[derive(Clone)]
pub struct TtlCache<V> {
    name: &'static str,
    config: CacheConfig,
    entries: Arc<RwLock<Entries<V>>>,
    counters: Arc<CacheCounters>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty cache. `name` labels logs and metrics.
    pub fn new(name: &'static str, config: CacheConfig) -> Self {
        Self {
            name,
            config,
            entries: Arc::new(RwLock::new(HashMap::new())),
            counters: Arc::new(CacheCounters::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Return the value for `key` if present and unexpired
    ///
    /// Takes the write lock only when an expired entry has to be purged.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let lookup = {
            let entries = self.entries.read().await;
            self.lookup(&entries, key, now)
        };

        let value = match lookup {
            Lookup::Hit(value) => Some(value),
            Lookup::Expired => {
                self.purge_expired_keys([key], now).await;
                None
            }
            Lookup::Missing => None,
        };

        self.record_lookups(u64::from(value.is_some()), u64::from(value.is_none()));
        value
    }

    /// Partition `keys` into live cache hits and misses
    ///
    /// Misses are returned in the order the keys were given.
    pub async fn get_many<'a, I>(&self, keys: I) -> (HashMap<String, V>, Vec<String>)
    where
        I: IntoIterator<Item = &'a String>,
    {
        let now = Instant::now();
        let mut hits = HashMap::new();
        let mut misses = Vec::new();
        let mut expired = Vec::new();

        {
            let entries = self.entries.read().await;
            for key in keys {
                match self.lookup(&entries, key, now) {
                    Lookup::Hit(value) => {
                        hits.insert(key.clone(), value);
                    }
                    Lookup::Expired => {
                        expired.push(key.as_str());
                        misses.push(key.clone());
                    }
                    Lookup::Missing => misses.push(key.clone()),
                }
            }
        }

        if !expired.is_empty() {
            self.purge_expired_keys(expired, now).await;
        }

        self.record_lookups(hits.len() as u64, misses.len() as u64);
        (hits, misses)
    }

    /// Store `value` under `key` with the current timestamp
    pub async fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = Instant::now();

        let evicted = {
            let mut entries = self.entries.write().await;
            let incoming = usize::from(!entries.contains_key(&key));
            let evicted = self.make_room(&mut entries, incoming, now);
            entries.insert(key, CacheEntry::new(value, now));
            evicted
        };

        self.record_evictions(evicted);
    }

    /// Store several entries under a single lock
    ///
    /// Room for the whole batch is made once, so a batch into a full cache
    /// purges expired entries a single time. Later duplicates of a key win.
    pub async fn set_many<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, V)>,
    {
        let batch: HashMap<String, V> = entries.into_iter().collect();
        if batch.is_empty() {
            return;
        }
        let now = Instant::now();

        let evicted = {
            let mut entries = self.entries.write().await;
            let incoming = batch.keys().filter(|key| !entries.contains_key(*key)).count();
            let mut evicted = self.make_room(&mut entries, incoming, now);

            for (key, value) in batch {
                entries.insert(key, CacheEntry::new(value, now));
            }

            // A batch larger than the whole cache keeps only as many keys as fit
            let overflow = entries.len().saturating_sub(self.config.max_entries);
            evicted += Self::evict_oldest(&mut entries, overflow);
            evicted
        };

        self.record_evictions(evicted);
    }

    /// Remove the entry for `key`, if any
    pub async fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().await;
        if entries.remove(key).is_some() {
            debug!(cache = self.name, key = %key, "Cache entry invalidated");
        }
    }

    /// Remove every entry
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
        debug!(cache = self.name, "Cache cleared");
    }

    /// Remove all entries older than the TTL and return how many were dropped
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();

        let (removed, remaining) = {
            let mut entries = self.entries.write().await;
            let removed = self.purge_expired(&mut entries, now);
            (removed, entries.len())
        };

        if removed > 0 {
            counter!("cache_swept_total", "cache" => self.name).increment(removed as u64);
        }
        debug!(cache = self.name, removed, remaining, "Cache sweep finished");

        removed
    }

    /// Number of stored entries, including expired ones not yet swept
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.len().await as u64;
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);

        CacheStats {
            hits,
            misses,
            entries,
            hit_rate: CacheStats::calculate_hit_rate(hits, misses),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            expired: self.counters.expired.load(Ordering::Relaxed),
        }
    }

    fn lookup(&self, entries: &Entries<V>, key: &str, now: Instant) -> Lookup<V> {
        match entries.get(key) {
            Some(entry) if !entry.is_expired(self.config.ttl, now) => {
                Lookup::Hit(entry.value.clone())
            }
            Some(_) => Lookup::Expired,
            None => Lookup::Missing,
        }
    }

    /// Drop the given keys if they are still expired once the write lock is held
    async fn purge_expired_keys<'a, I>(&self, keys: I, now: Instant)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ttl = self.config.ttl;
        let mut entries = self.entries.write().await;
        let mut removed = 0;

        for key in keys {
            // A concurrent set may have refreshed the entry meanwhile
            if entries.get(key).is_some_and(|entry| entry.is_expired(ttl, now)) {
                entries.remove(key);
                removed += 1;
            }
        }

        self.counters.expired.fetch_add(removed, Ordering::Relaxed);
    }

    fn purge_expired(&self, entries: &mut Entries<V>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.config.ttl, now));
        let removed = before - entries.len();
        self.counters.expired.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Make space for `incoming` new keys: purge expired entries, then evict
    /// the oldest. Returns the number of entries evicted.
    fn make_room(&self, entries: &mut Entries<V>, incoming: usize, now: Instant) -> u64 {
        let max = self.config.max_entries;
        if incoming == 0 || entries.len() + incoming <= max {
            return 0;
        }

        self.purge_expired(entries, now);

        let overflow = (entries.len() + incoming).saturating_sub(max);
        Self::evict_oldest(entries, overflow)
    }

    fn evict_oldest(entries: &mut Entries<V>, count: usize) -> u64 {
        let count = count.min(entries.len());
        match count {
            0 => return 0,
            1 => {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.stored_at)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
            _ => {
                let mut by_age: Vec<(Instant, String)> = entries
                    .iter()
                    .map(|(key, entry)| (entry.stored_at, key.clone()))
                    .collect();
                if count < by_age.len() {
                    by_age.select_nth_unstable(count - 1);
                }
                for (_, key) in by_age.into_iter().take(count) {
                    entries.remove(&key);
                }
            }
        }

        count as u64
    }

    fn record_lookups(&self, hits: u64, misses: u64) {
        if hits > 0 {
            self.counters.hits.fetch_add(hits, Ordering::Relaxed);
            counter!("cache_lookups_total", "cache" => self.name, "result" => "hit").increment(hits);
        }
        if misses > 0 {
            self.counters.misses.fetch_add(misses, Ordering::Relaxed);
            counter!("cache_lookups_total", "cache" => self.name, "result" => "miss")
                .increment(misses);
        }
    }

    fn record_evictions(&self, evicted: u64) {
        if evicted > 0 {
            self.counters.evictions.fetch_add(evicted, Ordering::Relaxed);
            counter!("cache_evictions_total", "cache" => self.name).increment(evicted);
            debug!(cache = self.name, evicted, "Evicted oldest cache entries");
        }
    }
}

/// A cache the [`CacheSweeper`] can purge on its timer
#[async_trait]
pub trait Sweepable: Send + Sync {
    fn name(&self) -> &'static str;

    async fn sweep(&self) -> usize;
}

#[async_trait]
impl<V> Sweepable for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn sweep(&self) -> usize {
        TtlCache::sweep(self).await
    }
}
