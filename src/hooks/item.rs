//! Single-record query, the detail-view counterpart of [`ListQuery`](crate::hooks::ListQuery).

use crate::framework::{Resource, ResourceProvider};
use crate::hooks::{resolve, QueryOptions, ViewState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ItemState<R> {
    pub data: Option<R>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl<R> Default for ItemState<R> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
        }
    }
}

impl<R> ItemState<R> {
    pub fn view_state(&self) -> ViewState {
        resolve(self.is_loading, self.error.as_deref(), usize::from(self.data.is_some()))
    }
}

/// Reactive view of one record, fetched with the provider's `get`.
///
/// Same rules as the list query: the latest request wins, and a failure keeps the record that
/// was already loaded.
pub struct ItemQuery<R: Resource> {
    provider: Arc<dyn ResourceProvider<R>>,
    id: Mutex<String>,
    state: watch::Sender<ItemState<R>>,
    seq: AtomicU64,
    options: QueryOptions,
}

impl<R: Resource> ItemQuery<R> {
    pub fn new(provider: Arc<dyn ResourceProvider<R>>, id: impl Into<String>) -> Self {
        Self::with_options(provider, id, QueryOptions::default())
    }

    pub fn with_options(
        provider: Arc<dyn ResourceProvider<R>>,
        id: impl Into<String>,
        options: QueryOptions,
    ) -> Self {
        let (state, _) = watch::channel(ItemState::default());
        Self {
            provider,
            id: Mutex::new(id.into()),
            state,
            seq: AtomicU64::new(0),
            options,
        }
    }

    pub fn id(&self) -> String {
        self.id.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub async fn activate(&self) {
        self.fetch(true).await;
    }

    pub async fn refetch(&self) {
        self.fetch(false).await;
    }

    /// Points the query at another record. Returns whether a fetch happened.
    pub async fn set_id(&self, id: impl Into<String>) -> bool {
        let id = id.into();
        {
            let mut current = self.id.lock().unwrap_or_else(PoisonError::into_inner);
            if *current == id {
                return false;
            }
            *current = id;
        }
        self.fetch(true).await;
        true
    }

    pub fn state(&self) -> ItemState<R> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ItemState<R>> {
        self.state.subscribe()
    }

    async fn fetch(&self, use_cache: bool) {
        let resource = R::PATH;
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let id = self.id();
        let key = format!("item/{id}");

        if use_cache {
            if let Some(item) = self
                .options
                .cache
                .as_ref()
                .and_then(|cache| cache.get::<R>(resource, &key))
            {
                debug!(resource, %id, "Cache hit");
                self.state.send_modify(|state| {
                    state.data = Some(item);
                    state.is_loading = false;
                    state.error = None;
                });
                return;
            }
        }

        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        let generation = self.options.cache.as_ref().map(|cache| cache.generation(resource));
        let started = Instant::now();
        let result = self.provider.get(&id).await;
        self.options.loading.settle(started).await;

        if self.seq.load(Ordering::SeqCst) != seq {
            debug!(resource, %id, seq, "Discarding stale result");
            return;
        }

        match result {
            Ok(item) => {
                if let (Some(cache), Some(generation)) = (&self.options.cache, generation) {
                    cache.put_if_current(resource, &key, generation, item.clone());
                }
                self.state.send_modify(|state| {
                    state.data = Some(item);
                    state.is_loading = false;
                });
            }
            Err(e) => {
                warn!(resource, %id, error = %e, "Fetch failed");
                self.state.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(e.to_string());
                });
            }
        }
    }
}
