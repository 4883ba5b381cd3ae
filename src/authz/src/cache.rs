//! TTL cache of rule sets keyed by namespace

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::types::Rule;

/// Default time a cached rule set stays valid
pub const DEFAULT_RULE_CACHE_TTL: Duration = Duration::from_secs(120);

/// Cached rule set with the time it was stored
#[derive(Clone)]
struct CachedRules {
    rules: Arc<Vec<Rule>>,
    stored_at: Instant,
}

impl CachedRules {
    fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules: Arc::new(rules),
            stored_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }
}

/// Rule cache
///
/// Reads take a shared lock, writes an exclusive one. An entry is a hit only
/// while it is younger than the TTL; expired entries stay in place until the
/// next `put` for their namespace overwrites them.
pub struct RuleCache {
    entries: RwLock<HashMap<String, CachedRules>>,
    ttl: Duration,
    hits: AtomicUsize,
    misses: AtomicUsize,
    expirations: AtomicUsize,
}

impl RuleCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            expirations: AtomicUsize::new(0),
        }
    }

    /// Rules cached for the namespace, if still fresh
    pub fn get(&self, namespace: &str) -> Option<Arc<Vec<Rule>>> {
        let entries = self.entries.read();

        match entries.get(namespace) {
            Some(entry) if !entry.is_expired(self.ttl) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(&entry.rules))
            }
            Some(_) => {
                self.expirations.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store the rules for a namespace, replacing any previous entry
    pub fn put(&self, namespace: &str, rules: Vec<Rule>) -> Arc<Vec<Rule>> {
        let entry = CachedRules::new(rules);
        let rules = Arc::clone(&entry.rules);
        self.entries.write().insert(namespace.to_string(), entry);
        rules
    }

    /// Drop the entry for a namespace
    pub fn invalidate(&self, namespace: &str) {
        self.entries.write().remove(namespace);
    }

    /// Drop every entry and reset statistics
    pub fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.expirations.store(0, Ordering::Relaxed);
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            entries: self.entries.read().len(),
        }
    }
}

impl Default for RuleCache {
    fn default() -> Self {
        Self::new(DEFAULT_RULE_CACHE_TTL)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub expirations: usize,
    pub entries: usize,
}

impl CacheStats {
    /// Calculate cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
