//! In-memory cache of the fetched collections.
//!
//! Each scope keeps its collection together with the instant it was fetched.
//! Collections are shared through `Arc` so a cache hit hands back the very
//! same allocation.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::event::EventRecord;
use crate::user::UserRecord;

/// Default time-to-live for cached collections.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Which dataset an invalidation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheScope {
    Events,
    Users,
}

/// A collection and when it was fetched.
#[derive(Debug)]
pub struct CacheEntry<T> {
    collection: Arc<Vec<T>>,
    last_update: Option<Instant>,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        CacheEntry {
            collection: Arc::new(Vec::new()),
            last_update: None,
        }
    }
}

impl<T> CacheEntry<T> {
    pub fn is_valid(&self, now: Instant, ttl: Duration) -> bool {
        self.last_update
            .is_some_and(|at| now.saturating_duration_since(at) < ttl)
    }

    /// The collection if it is still fresh.
    pub fn fresh(&self, now: Instant, ttl: Duration) -> Option<Arc<Vec<T>>> {
        self.is_valid(now, ttl).then(|| Arc::clone(&self.collection))
    }

    /// Whatever is held, fresh or not.
    pub fn collection(&self) -> &Arc<Vec<T>> {
        &self.collection
    }

    pub fn last_update(&self) -> Option<Instant> {
        self.last_update
    }

    /// Swap in a new collection wholesale.
    pub fn replace(&mut self, items: Vec<T>, now: Instant) -> Arc<Vec<T>> {
        self.collection = Arc::new(items);
        self.last_update = Some(now);
        Arc::clone(&self.collection)
    }

    pub fn clear(&mut self) {
        *self = CacheEntry::default();
    }
}

/// Events and users caches sharing one TTL.
#[derive(Debug)]
pub struct CacheStore {
    pub events: CacheEntry<EventRecord>,
    pub users: CacheEntry<UserRecord>,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(ttl: Duration) -> Self {
        CacheStore {
            events: CacheEntry::default(),
            users: CacheEntry::default(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Clear one scope, or everything when `scope` is `None`.
    pub fn invalidate(&mut self, scope: Option<CacheScope>) {
        match scope {
            Some(CacheScope::Events) => self.events.clear(),
            Some(CacheScope::Users) => self.users.clear(),
            None => {
                self.events.clear();
                self.users.clear();
            }
        }
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        CacheStore::new(DEFAULT_TTL)
    }
}
