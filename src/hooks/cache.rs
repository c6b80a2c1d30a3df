//! # Shared query cache
//!
//! A process-wide cache of successful query results keyed by resource and request, plus an
//! invalidation bus. Mutations invalidate their resource; list queries that
//! [watch invalidations](crate::hooks::ListQuery::watch_invalidations) refetch when that happens.
//!
//! Each resource also carries a generation that `invalidate` bumps. A query captures it before
//! calling its provider and stores through [`QueryCache::put_if_current`], so a result fetched
//! before an invalidation can never repopulate the cache after it.
//!
//! The entry map sits behind a `std::sync::Mutex` that is only held for short synchronous
//! sections, never across an `.await`.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::debug;

/// How long an entry is served before queries go back to the provider.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

const EVENT_BUFFER: usize = 64;

/// Published when a resource's cached results become invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalidation {
    pub resource: &'static str,
}

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    stored_at: Instant,
}

#[derive(Default)]
struct State {
    entries: HashMap<(&'static str, String), Entry>,
    generations: HashMap<&'static str, u64>,
}

struct Inner {
    state: Mutex<State>,
    events: broadcast::Sender<Invalidation>,
    ttl: Duration,
}

/// Cloneable handle to the shared cache.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .field("ttl", &self.inner.ttl)
            .finish()
    }
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                events,
                ttl,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A fresh entry, if there is one of type `T`.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, resource: &'static str, key: &str) -> Option<T> {
        let mut state = self.state();
        let map_key = (resource, key.to_string());
        let entry = state.entries.get(&map_key)?;
        if entry.stored_at.elapsed() > self.inner.ttl {
            state.entries.remove(&map_key);
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    pub fn put<T: Clone + Send + Sync + 'static>(&self, resource: &'static str, key: &str, value: T) {
        insert(&mut self.state(), resource, key, value);
    }

    /// Number of invalidations `resource` has seen.
    pub fn generation(&self, resource: &'static str) -> u64 {
        self.state().generations.get(resource).copied().unwrap_or(0)
    }

    /// Stores `value` only if `resource` has not been invalidated since `generation` was read.
    /// Returns whether the entry was written.
    pub fn put_if_current<T: Clone + Send + Sync + 'static>(
        &self,
        resource: &'static str,
        key: &str,
        generation: u64,
        value: T,
    ) -> bool {
        let mut state = self.state();
        let current = state.generations.get(resource).copied().unwrap_or(0);
        if current != generation {
            debug!(resource, %key, generation, current, "Skipping cache write after invalidation");
            return false;
        }
        insert(&mut state, resource, key, value);
        true
    }

    /// Drops every entry of `resource`, bumps its generation and notifies subscribers.
    pub fn invalidate(&self, resource: &'static str) {
        let (removed, generation) = {
            let mut state = self.state();
            let before = state.entries.len();
            state.entries.retain(|(r, _), _| *r != resource);
            let removed = before - state.entries.len();
            let generation = state.generations.entry(resource).or_insert(0);
            *generation += 1;
            (removed, *generation)
        };
        let listeners = self.inner.events.send(Invalidation { resource }).unwrap_or(0);
        debug!(resource, removed, generation, listeners, "Invalidated");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.inner.events.subscribe()
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn insert<T: Clone + Send + Sync + 'static>(state: &mut State, resource: &'static str, key: &str, value: T) {
    state.entries.insert(
        (resource, key.to_string()),
        Entry {
            value: Arc::new(value),
            stored_at: Instant::now(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_and_type_mismatch() {
        let cache = QueryCache::default();
        cache.put("obras", "page=1", vec![1_u32, 2, 3]);
        assert_eq!(cache.get::<Vec<u32>>("obras", "page=1"), Some(vec![1, 2, 3]));
        assert_eq!(cache.get::<String>("obras", "page=1"), None);
        assert_eq!(cache.get::<Vec<u32>>("pagos", "page=1"), None);
    }

    #[tokio::test]
    async fn test_invalidate_only_touches_one_resource() {
        let cache = QueryCache::default();
        let mut events = cache.subscribe();
        cache.put("obras", "", 1_u8);
        cache.put("obras", "page=2", 2_u8);
        cache.put("pagos", "", 3_u8);

        cache.invalidate("obras");

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get::<u8>("pagos", ""), Some(3));
        assert_eq!(events.recv().await.unwrap(), Invalidation { resource: "obras" });
    }

    #[test]
    fn test_write_from_before_invalidation_is_dropped() {
        let cache = QueryCache::default();
        let generation = cache.generation("obras");
        cache.invalidate("obras");

        assert!(!cache.put_if_current("obras", "page=1", generation, 1_u8));
        assert_eq!(cache.get::<u8>("obras", "page=1"), None);

        assert_eq!(cache.generation("pagos"), 0);
        assert!(cache.put_if_current("pagos", "page=1", 0, 2_u8));
        let generation = cache.generation("obras");
        assert!(cache.put_if_current("obras", "page=1", generation, 3_u8));
        assert_eq!(cache.get::<u8>("obras", "page=1"), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = QueryCache::new(Duration::from_secs(5));
        cache.put("obras", "", 7_i32);
        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(cache.get::<i32>("obras", ""), None);
        assert!(cache.is_empty());
    }
}
