//! # Mutations
//!
//! [`Mutation`] wraps one provider write (`create`, `update` or `delete`) with
//! `{loading, error}` state. Errors are captured into the state and `mutate` returns `None`;
//! nothing is raised to the caller.
//!
//! A mutation never touches list state. Either refetch the affected lists at the call site, or
//! build the mutation [`with_cache`](Mutation::with_cache) so that success invalidates the
//! resource and watching list queries refetch on their own.

use crate::framework::{ProviderError, Resource, ResourceProvider};
use crate::hooks::QueryCache;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

type MutationFuture<O> = Pin<Box<dyn Future<Output = Result<O, ProviderError>> + Send>>;
type MutationFn<I, O> = Box<dyn Fn(I) -> MutationFuture<O> + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationState {
    pub loading: bool,
    pub error: Option<String>,
}

pub struct Mutation<I, O> {
    resource: &'static str,
    run: MutationFn<I, O>,
    state: watch::Sender<MutationState>,
    cache: Option<QueryCache>,
}

impl<I: Send + 'static, O: Send + 'static> Mutation<I, O> {
    /// A mutation over an arbitrary provider call. `resource` names what gets invalidated.
    pub fn new<F, Fut>(resource: &'static str, run: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, ProviderError>> + Send + 'static,
    {
        let (state, _) = watch::channel(MutationState::default());
        Self {
            resource,
            run: Box::new(move |input| Box::pin(run(input))),
            state,
            cache: None,
        }
    }

    /// Invalidate `resource` in `cache` after every successful call.
    pub fn with_cache(mut self, cache: QueryCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn mutate(&self, input: I) -> Option<O> {
        let resource = self.resource;
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let result = (self.run)(input).await;

        match result {
            Ok(output) => {
                debug!(resource, "Mutation succeeded");
                if let Some(cache) = &self.cache {
                    cache.invalidate(resource);
                }
                self.state.send_modify(|state| state.loading = false);
                Some(output)
            }
            Err(e) => {
                warn!(resource, error = %e, "Mutation failed");
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(e.to_string());
                });
                None
            }
        }
    }

    pub fn state(&self) -> MutationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.state.subscribe()
    }

    /// Clears a previous error, e.g. when the form is edited again.
    pub fn reset(&self) {
        self.state.send_replace(MutationState::default());
    }
}

impl<R: Resource> Mutation<R::Create, R> {
    pub fn create(provider: Arc<dyn ResourceProvider<R>>) -> Self {
        Self::new(R::PATH, move |input: R::Create| {
            let provider = provider.clone();
            async move { provider.create(input).await }
        })
    }
}

impl<R: Resource> Mutation<(String, R::Update), R> {
    /// Input is `(id, changes)`.
    pub fn update(provider: Arc<dyn ResourceProvider<R>>) -> Self {
        Self::new(R::PATH, move |(id, input): (String, R::Update)| {
            let provider = provider.clone();
            async move { provider.update(&id, input).await }
        })
    }
}

impl Mutation<String, ()> {
    /// Input is the id to delete.
    pub fn delete<R: Resource>(provider: Arc<dyn ResourceProvider<R>>) -> Self {
        Self::new(R::PATH, move |id: String| {
            let provider = provider.clone();
            async move { provider.delete(&id).await }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixtures;
    use crate::framework::mock::MockProvider;
    use crate::model::{Pago, PagoEstado, PagoUpdate};
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_update_success_and_failure() {
        let mut pago = fixtures::pagos()[2].clone();
        let mock = MockProvider::<Pago>::new();
        pago.estado = PagoEstado::Completado;
        mock.expect_update("pago-003").return_ok(pago.clone());
        mock.expect_update("pago-003").return_err(ProviderError::Http {
            status: 422,
            message: "monto: must be greater than 0".into(),
            field_errors: BTreeMap::new(),
        });

        let mutation = Mutation::update(mock.clone() as Arc<dyn ResourceProvider<Pago>>);
        let changes = PagoUpdate {
            estado: Some(PagoEstado::Completado),
            ..Default::default()
        };

        let updated = mutation.mutate(("pago-003".to_string(), changes.clone())).await;
        assert_eq!(updated.unwrap().estado, PagoEstado::Completado);
        assert_eq!(mutation.state(), MutationState::default());

        let failed = mutation.mutate(("pago-003".to_string(), changes)).await;
        assert!(failed.is_none());
        let state = mutation.state();
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("monto: must be greater than 0"));

        mutation.reset();
        assert_eq!(mutation.state().error, None);
        mock.verify();
    }

    #[tokio::test]
    async fn test_success_invalidates_cache() {
        let cache = QueryCache::default();
        let mut events = cache.subscribe();
        cache.put("pagos", "", 1_u8);

        let mock = MockProvider::<Pago>::new();
        mock.expect_delete("pago-001").return_ok();
        let mutation = Mutation::delete(mock.clone() as Arc<dyn ResourceProvider<Pago>>).with_cache(cache.clone());

        assert_eq!(mutation.mutate("pago-001".to_string()).await, Some(()));
        assert!(cache.is_empty());
        assert_eq!(events.recv().await.unwrap().resource, "pagos");
        mock.verify();
    }
}
