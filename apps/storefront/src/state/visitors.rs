//! # Visitor Map
//!
//! Per-visitor values (carts, sign-ins) keyed by the visitor id kept in the
//! session cookie.
//!
//! Entries idle for longer than the configured window are pruned whenever a
//! new visitor is added, so abandoned carts do not pile up.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};

struct Entry<T> {
    value: T,
    last_seen: DateTime<Utc>,
}

pub struct VisitorMap<T> {
    entries: Arc<Mutex<HashMap<String, Entry<T>>>>,
    idle: Duration,
}

impl<T> VisitorMap<T> {
    pub fn new(idle: Duration) -> Self {
        VisitorMap {
            entries: Arc::new(Mutex::new(HashMap::new())),
            idle,
        }
    }

    /// Runs `f` with the visitor's value, or `None` for an unknown visitor.
    /// Never creates an entry.
    pub fn read<F, R>(&self, visitor: &str, f: F) -> R
    where
        F: FnOnce(Option<&T>) -> R,
    {
        let mut entries = self.lock();
        let entry = entries.get_mut(visitor).map(|entry| {
            entry.last_seen = Utc::now();
            &entry.value
        });
        f(entry)
    }

    /// Runs `f` with the visitor's value, creating it with `init` first if
    /// the visitor has none.
    pub fn write<I, F, R>(&self, visitor: &str, init: I, f: F) -> R
    where
        I: FnOnce() -> T,
        F: FnOnce(&mut T) -> R,
    {
        let now = Utc::now();
        let mut entries = self.lock();

        if !entries.contains_key(visitor) {
            let idle = self.idle;
            entries.retain(|_, entry| now - entry.last_seen < idle);
        }

        let entry = entries.entry(visitor.to_string()).or_insert_with(|| Entry {
            value: init(),
            last_seen: now,
        });
        entry.last_seen = now;
        f(&mut entry.value)
    }

    /// Like [`write`](Self::write), but leaves unknown visitors alone.
    pub fn update<F, R>(&self, visitor: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut entries = self.lock();
        entries.get_mut(visitor).map(|entry| {
            entry.last_seen = Utc::now();
            f(&mut entry.value)
        })
    }

    /// Number of visitors currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Values are only changed through total functions, so a panic in
    // another handler cannot leave one half-updated.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Clone for VisitorMap<T> {
    fn clone(&self) -> Self {
        VisitorMap {
            entries: Arc::clone(&self.entries),
            idle: self.idle,
        }
    }
}

impl<T> fmt::Debug for VisitorMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisitorMap")
            .field("visitors", &self.len())
            .field("idle", &self.idle)
            .finish()
    }
}
