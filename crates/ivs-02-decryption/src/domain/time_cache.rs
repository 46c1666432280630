//! # Time-Bounded Cache
//!
//! Map whose entries expire after a fixed time-to-live. Used for retired
//! request ids and for notifications that arrive before their request is
//! registered.
//!
//! Expired entries are invisible to lookups immediately and are physically
//! removed by a periodic garbage collection piggybacked on `insert`, which
//! bounds memory without a background task. An optional capacity caps the
//! number of live entries; `try_insert` refuses new keys once it is reached.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

pub struct TimeBoundedCache<K, V> {
    /// key -> (inserted at, value)
    entries: HashMap<K, (Instant, V)>,
    ttl: Duration,
    last_gc: Instant,
    gc_interval: Duration,
    capacity: Option<usize>,
}

impl<K: Eq + Hash, V> TimeBoundedCache<K, V> {
    /// Default garbage collection interval.
    pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(10);

    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_config(ttl, Self::DEFAULT_GC_INTERVAL)
    }

    #[must_use]
    pub fn with_config(ttl: Duration, gc_interval: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            last_gc: Instant::now(),
            gc_interval,
            capacity: None,
        }
    }

    /// Cap the number of entries accepted by `try_insert`.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Insert or refresh an entry unless that would exceed the capacity.
    ///
    /// Refreshing an existing key always succeeds. When full, expired entries
    /// are collected first; `Err(value)` hands back a value that still does
    /// not fit.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, V> {
        if let Some(capacity) = self.capacity {
            if !self.entries.contains_key(&key) && self.entries.len() >= capacity {
                let now = Instant::now();
                self.garbage_collect(now);
                self.last_gc = now;
                if self.entries.len() >= capacity {
                    return Err(value);
                }
            }
        }
        Ok(self.insert(key, value))
    }

    /// Insert or refresh an entry. Returns the previous live value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let now = Instant::now();
        if now.duration_since(self.last_gc) > self.gc_interval {
            self.garbage_collect(now);
            self.last_gc = now;
        }

        self.entries
            .insert(key, (now, value))
            .filter(|(at, _)| !self.is_expired(*at, now))
            .map(|(_, v)| v)
    }

    /// Remove and return a live entry.
    pub fn take(&mut self, key: &K) -> Option<V> {
        let now = Instant::now();
        let (at, value) = self.entries.remove(key)?;
        (!self.is_expired(at, now)).then_some(value)
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|(at, _)| !self.is_expired(*at, now))
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Number of stored entries, including expired ones not yet collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn garbage_collect(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, (at, _)| now.saturating_duration_since(*at) < ttl);
        before - self.entries.len()
    }

    fn is_expired(&self, inserted_at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(inserted_at) >= self.ttl
    }
}
