//! # Resource list query
//!
//! [`ListQuery`] is the reactive list a data view binds to. It owns one state slice
//! (`{data, page, is_loading, error}`) published on a `watch` channel, and runs the provider's
//! `list` operation on [`activate`](ListQuery::activate), [`refetch`](ListQuery::refetch) and
//! parameter changes.
//!
//! ## Latest request wins
//!
//! Every fetch takes the next sequence number. When a fetch completes, its result is applied
//! only if no newer fetch has started since; older results are dropped. Dropping the query
//! bumps the sequence too, so a result that lands afterwards is never applied.
//!
//! Results are written to the shared cache only if the resource was not invalidated while the
//! request was in flight.
//!
//! ## Failure keeps data
//!
//! A failed fetch records the error message and clears `is_loading`, but leaves the
//! previously loaded rows in place.

use crate::framework::{ListParams, Page, Resource, ResourceProvider};
use crate::hooks::{resolve, QueryCache, ViewState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// How loading is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadingPolicy {
    pub show_indicators: bool,
    /// Minimum time `is_loading` stays true once a fetch starts, to avoid a spinner flash.
    pub min_duration: Duration,
}

impl LoadingPolicy {
    /// Never holds a fetch back.
    pub fn immediate() -> Self {
        Self::default()
    }

    pub(crate) fn hold(&self) -> Option<Duration> {
        (self.show_indicators && !self.min_duration.is_zero()).then_some(self.min_duration)
    }

    /// Sleeps until `min_duration` has passed since `started`.
    pub(crate) async fn settle(&self, started: Instant) {
        if let Some(min) = self.hold() {
            let elapsed = started.elapsed();
            if elapsed < min {
                tokio::time::sleep(min - elapsed).await;
            }
        }
    }
}

/// Options shared by every query built by one system.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub loading: LoadingPolicy,
    pub cache: Option<QueryCache>,
}

/// Pagination metadata of the last successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageInfo {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> From<&Page<T>> for PageInfo {
    fn from(page: &Page<T>) -> Self {
        Self {
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages,
        }
    }
}

/// Snapshot of a list query.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<R> {
    pub data: Vec<R>,
    pub page: Option<PageInfo>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl<R> Default for ListState<R> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            page: None,
            is_loading: false,
            error: None,
        }
    }
}

impl<R> ListState<R> {
    pub fn view_state(&self) -> ViewState {
        resolve(self.is_loading, self.error.as_deref(), self.data.len())
    }
}

struct Inner<R: Resource> {
    provider: Arc<dyn ResourceProvider<R>>,
    params: Mutex<ListParams>,
    state: watch::Sender<ListState<R>>,
    seq: AtomicU64,
    options: QueryOptions,
}

impl<R: Resource> Inner<R> {
    fn params(&self) -> MutexGuard<'_, ListParams> {
        self.params.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, seq: u64) -> bool {
        self.seq.load(Ordering::SeqCst) == seq
    }

    fn apply_page(&self, page: Page<R>) {
        let info = PageInfo::from(&page);
        self.state.send_modify(|state| {
            state.data = page.data;
            state.page = Some(info);
            state.is_loading = false;
            state.error = None;
        });
    }

    async fn fetch(&self, use_cache: bool) {
        let resource = R::PATH;
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let params = self.params().clone();
        let key = params.cache_key();

        if use_cache {
            if let Some(page) = self
                .options
                .cache
                .as_ref()
                .and_then(|cache| cache.get::<Page<R>>(resource, &key))
            {
                debug!(resource, seq, %key, "Cache hit");
                self.apply_page(page);
                return;
            }
        }

        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        let generation = self.options.cache.as_ref().map(|cache| cache.generation(resource));
        let started = Instant::now();
        let result = self.provider.list(&params).await;
        self.options.loading.settle(started).await;

        if !self.is_current(seq) {
            debug!(resource, seq, "Discarding stale result");
            return;
        }

        match result {
            Ok(page) => {
                debug!(resource, seq, total = page.total, "Fetched");
                if let (Some(cache), Some(generation)) = (&self.options.cache, generation) {
                    cache.put_if_current(resource, &key, generation, page.clone());
                }
                self.apply_page(page);
            }
            Err(e) => {
                warn!(resource, seq, error = %e, "Fetch failed");
                self.state.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(e.to_string());
                });
            }
        }
    }
}

/// Reactive list of one resource.
///
/// # Example
/// ```ignore
/// let obras = ListQuery::new(provider.obras(), ListParams::new().filter("estado", "activa"));
/// obras.activate().await;
/// match obras.state().view_state() {
///     ViewState::Data => { /* render rows */ }
///     _ => { /* ... */ }
/// }
/// ```
pub struct ListQuery<R: Resource> {
    inner: Arc<Inner<R>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl<R: Resource> ListQuery<R> {
    pub fn new(provider: Arc<dyn ResourceProvider<R>>, params: ListParams) -> Self {
        Self::with_options(provider, params, QueryOptions::default())
    }

    pub fn with_options(
        provider: Arc<dyn ResourceProvider<R>>,
        params: ListParams,
        options: QueryOptions,
    ) -> Self {
        let (state, _) = watch::channel(ListState::default());
        Self {
            inner: Arc::new(Inner {
                provider,
                params: Mutex::new(params),
                state,
                seq: AtomicU64::new(0),
                options,
            }),
            watcher: Mutex::new(None),
        }
    }

    /// First load. Served from the cache when a fresh entry exists.
    pub async fn activate(&self) {
        self.inner.fetch(true).await;
    }

    /// Always goes to the provider.
    pub async fn refetch(&self) {
        self.inner.fetch(false).await;
    }

    /// Replaces the parameters and re-runs the query if they changed by value.
    /// Returns whether a fetch happened.
    pub async fn set_params(&self, params: ListParams) -> bool {
        {
            let mut current = self.inner.params();
            if *current == params {
                return false;
            }
            *current = params;
        }
        self.inner.fetch(true).await;
        true
    }

    pub fn params(&self) -> ListParams {
        self.inner.params().clone()
    }

    pub fn state(&self) -> ListState<R> {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState<R>> {
        self.inner.state.subscribe()
    }

    /// Refetches in the background whenever this resource is invalidated in the shared cache.
    /// Returns `false` when the query has no cache. Calling it twice keeps a single watcher.
    pub fn watch_invalidations(&self) -> bool {
        let Some(cache) = &self.inner.options.cache else {
            return false;
        };
        let mut watcher = self.watcher.lock().unwrap_or_else(PoisonError::into_inner);
        if watcher.is_some() {
            return true;
        }
        let events = cache.subscribe();
        let inner = Arc::downgrade(&self.inner);
        *watcher = Some(tokio::spawn(watch_loop(inner, events)));
        true
    }
}

async fn watch_loop<R: Resource>(inner: Weak<Inner<R>>, mut events: broadcast::Receiver<crate::hooks::Invalidation>) {
    loop {
        match events.recv().await {
            Ok(event) if event.resource != R::PATH => continue,
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                debug!(resource = R::PATH, "Invalidated, refetching");
                inner.fetch(false).await;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

impl<R: Resource> Drop for ListQuery<R> {
    fn drop(&mut self) {
        // Any fetch still in flight is now stale.
        self.inner.seq.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self
            .watcher
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}
