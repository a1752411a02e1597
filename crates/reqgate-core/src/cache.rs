//! Idempotency cache for pipeline results
//!
//! Results are memoized under an [`IdempotencyKey`] derived from the schema
//! identity, the mode, the endpoint's validator chain and the canonicalized
//! merged input. Entries are write-once: once a key holds a live entry, later
//! `put`s for the same key keep the first result and hand it back to the
//! caller. The store is process-local and optionally bounded by entry count
//! (oldest insertion evicted first) and by age.
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use crate::mode::ValidationMode;
use crate::types::{FieldMap, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Deterministic digest identifying one validation of one input
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdempotencyKey([u8; 32]);

impl IdempotencyKey {
    /// Derive the key for a merged field map
    ///
    /// `fingerprint` identifies the endpoint, so two separately built endpoints
    /// sharing a schema never share entries.
    pub fn derive(
        schema_id: &str,
        mode: ValidationMode,
        fingerprint: &str,
        merged: &FieldMap,
    ) -> Self {
        let canonical = canonicalize(&Value::Object(merged.clone())).to_string();

        let mut hasher = Sha256::new();
        for part in [schema_id, mode.as_str(), fingerprint, canonical.as_str()] {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part.as_bytes());
        }
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First twelve hex digits, for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdempotencyKey({})", self.short())
    }
}

/// Rebuild `value` with every object's keys in sorted order
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = FieldMap::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key.as_str()]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Configuration for cache behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether results are memoized at all
    pub enabled: bool,
    /// Maximum number of entries; `None` means unbounded
    pub max_entries: Option<usize>,
    /// Maximum entry age in seconds; `None` means entries never expire
    pub ttl_secs: Option<u64>,
    /// Serialize concurrent computations of the same key
    ///
    /// Waiting callers block their thread on a `std::sync::Mutex` until the
    /// first computation finishes. Async hosts must call the pipeline from a
    /// blocking-capable thread; the axum extractor moves such calls onto
    /// tokio's blocking pool.
    pub single_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: None,
            ttl_secs: None,
            single_flight: false,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: Option<usize>,
    pub hits: u64,
    pub misses: u64,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    result: ValidationResult,
    cached_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => self.cached_at.elapsed() < ttl,
            None => true,
        }
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<IdempotencyKey, CacheEntry>,
    insertion_order: VecDeque<IdempotencyKey>,
}

impl CacheInner {
    fn remove(&mut self, key: &IdempotencyKey) {
        if self.entries.remove(key).is_some() {
            self.insertion_order.retain(|k| k != key);
        }
    }

    fn evict_oldest(&mut self) -> bool {
        while let Some(oldest) = self.insertion_order.pop_front() {
            if self.entries.remove(&oldest).is_some() {
                debug!(key = %oldest.short(), "evicted idempotency entry");
                return true;
            }
        }
        false
    }
}

/// Process-local, write-once store of pipeline results
///
/// Create one per process (or per test) and share it through an `Arc`.
#[derive(Debug, Default)]
pub struct IdempotencyCache {
    config: CacheConfig,
    inner: Mutex<CacheInner>,
    flights: Mutex<HashMap<IdempotencyKey, Arc<Mutex<()>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl IdempotencyCache {
    /// Create an unbounded cache with default configuration
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a cache with custom configuration
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CacheInner::default()),
            flights: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up a live entry
    pub fn get(&self, key: &IdempotencyKey) -> Option<ValidationResult> {
        let found = self.lookup(key);
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Store `result` unless a live entry already exists
    ///
    /// Returns the retained result: `result` itself when it was stored, the
    /// earlier entry otherwise. With caching disabled `result` is returned
    /// without being stored.
    pub fn put(&self, key: IdempotencyKey, result: ValidationResult) -> ValidationResult {
        if !self.config.enabled || self.config.max_entries == Some(0) {
            return result;
        }

        let ttl = self.config.ttl();
        let mut inner = self.lock_inner();
        if let Some(existing) = inner.entries.get(&key) {
            if existing.is_live(ttl) {
                return existing.result.clone();
            }
            inner.remove(&key);
        }

        if let Some(max) = self.config.max_entries {
            while inner.entries.len() >= max && inner.evict_oldest() {}
        }

        inner.entries.insert(
            key,
            CacheEntry {
                result: result.clone(),
                cached_at: Instant::now(),
            },
        );
        inner.insertion_order.push_back(key);
        result
    }

    /// Return the cached result for `key` or compute, store and return it
    ///
    /// With `single_flight` enabled, concurrent callers for the same key wait
    /// for the first computation instead of running `compute` themselves.
    pub fn get_or_compute<F>(&self, key: IdempotencyKey, compute: F) -> ValidationResult
    where
        F: FnOnce() -> ValidationResult,
    {
        if !self.config.enabled {
            return compute();
        }

        if let Some(hit) = self.get(&key) {
            debug!(key = %key.short(), "idempotency cache hit");
            return hit;
        }

        if !self.config.single_flight {
            return self.put(key, compute());
        }

        let flight = {
            let mut flights = self.flights.lock().unwrap_or_else(PoisonError::into_inner);
            flights.entry(key).or_default().clone()
        };
        let guard = flight.lock().unwrap_or_else(PoisonError::into_inner);

        let retained = match self.lookup(&key) {
            Some(hit) => {
                debug!(key = %key.short(), "joined in-flight validation");
                hit
            }
            None => self.put(key, compute()),
        };

        drop(guard);
        self.flights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        retained
    }

    /// Check for a live entry without touching the statistics
    pub fn contains(&self, key: &IdempotencyKey) -> bool {
        self.lookup(key).is_some()
    }

    /// Number of stored entries, expired ones included until cleaned up
    pub fn len(&self) -> usize {
        self.lock_inner().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry and reset the statistics
    pub fn clear(&self) {
        let mut inner = self.lock_inner();
        inner.entries.clear();
        inner.insertion_order.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Remove expired entries, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let Some(ttl) = self.config.ttl() else {
            return 0;
        };

        let mut inner = self.lock_inner();
        let expired: Vec<IdempotencyKey> = inner
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_live(Some(ttl)))
            .map(|(key, _)| *key)
            .collect();

        for key in &expired {
            inner.remove(key);
        }
        expired.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            max_entries: self.config.max_entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            enabled: self.config.enabled,
        }
    }

    fn lookup(&self, key: &IdempotencyKey) -> Option<ValidationResult> {
        if !self.config.enabled {
            return None;
        }

        let ttl = self.config.ttl();
        let inner = self.lock_inner();
        inner
            .entries
            .get(key)
            .filter(|entry| entry.is_live(ttl))
            .map(|entry| entry.result.clone())
    }

    fn lock_inner(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
