//! # Mock Provider
//!
//! Utilities for testing queries and mutations in isolation.
//!
//! [`MockProvider`] implements [`ResourceProvider`] by replaying a queue of scripted responses.
//! Use the `expect_*` builders to queue them, hand `mock.clone()` to the code under test as an
//! `Arc<dyn ResourceProvider<R>>`, then call [`MockProvider::verify`].

use crate::framework::{ListParams, Page, ProviderError, Resource, ResourceProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// Represents an expected call to the mock provider and the response it gets.
enum Expectation<R: Resource> {
    List {
        response: Result<Page<R>, ProviderError>,
    },
    Get {
        id: String,
        response: Result<R, ProviderError>,
    },
    Create {
        response: Result<R, ProviderError>,
    },
    Update {
        id: String,
        response: Result<R, ProviderError>,
    },
    Delete {
        id: String,
        response: Result<(), ProviderError>,
    },
}

impl<R: Resource> Expectation<R> {
    fn op(&self) -> Op {
        match self {
            Expectation::List { .. } => Op::List,
            Expectation::Get { .. } => Op::Get,
            Expectation::Create { .. } => Op::Create,
            Expectation::Update { .. } => Op::Update,
            Expectation::Delete { .. } => Op::Delete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    List,
    Get,
    Create,
    Update,
    Delete,
}

struct Scripted<R: Resource> {
    expectation: Expectation<R>,
    delay: Option<Duration>,
}

type Queue<R> = Arc<Mutex<VecDeque<Scripted<R>>>>;

/// A scripted provider with expectation tracking for fluent testing.
///
/// # Example
/// ```ignore
/// let mock = MockProvider::<Obra>::new();
/// mock.expect_list().return_ok(Page::new(vec![obra], 1, 1, 50));
/// mock.expect_list().return_err(ProviderError::Transport("network down".into()));
///
/// let query = ListQuery::new(mock.clone(), ListParams::new());
/// // Use query in tests...
/// mock.verify(); // Ensures all expectations were met
/// ```
pub struct MockProvider<R: Resource> {
    expectations: Queue<R>,
    calls: Mutex<Vec<String>>,
}

impl<R: Resource> MockProvider<R> {
    /// Creates a new mock provider with no expectations.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            expectations: Arc::new(Mutex::new(VecDeque::new())),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Expects a `list` operation.
    pub fn expect_list(&self) -> ExpectationBuilder<R, Page<R>> {
        self.builder(Op::List, String::new())
    }

    /// Expects a `get` operation for `id`.
    pub fn expect_get(&self, id: impl Into<String>) -> ExpectationBuilder<R, R> {
        self.builder(Op::Get, id.into())
    }

    /// Expects a `create` operation.
    pub fn expect_create(&self) -> ExpectationBuilder<R, R> {
        self.builder(Op::Create, String::new())
    }

    /// Expects an `update` operation for `id`.
    pub fn expect_update(&self, id: impl Into<String>) -> ExpectationBuilder<R, R> {
        self.builder(Op::Update, id.into())
    }

    /// Expects a `delete` operation for `id`.
    pub fn expect_delete(&self, id: impl Into<String>) -> ExpectationBuilder<R, ()> {
        self.builder(Op::Delete, id.into())
    }

    fn builder<T>(&self, op: Op, id: String) -> ExpectationBuilder<R, T> {
        ExpectationBuilder {
            op,
            id,
            delay: None,
            expectations: self.expectations.clone(),
            _response: PhantomData,
        }
    }

    /// Operations received so far, in order (e.g. `"list"`, `"update obra-1"`).
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }

    async fn next(&self, op: Op, call: String) -> Expectation<R> {
        self.calls.lock().unwrap().push(call);
        let scripted = self.expectations.lock().unwrap().pop_front();
        let Some(scripted) = scripted else {
            panic!("Unexpected {op:?} request: no expectations left");
        };
        if scripted.expectation.op() != op {
            panic!(
                "Expectation mismatch: got {op:?}, expected {:?}",
                scripted.expectation.op()
            );
        }
        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }
        scripted.expectation
    }
}

#[async_trait]
impl<R: Resource> ResourceProvider<R> for MockProvider<R> {
    async fn list(&self, _params: &ListParams) -> Result<Page<R>, ProviderError> {
        match self.next(Op::List, "list".to_string()).await {
            Expectation::List { response } => response,
            _ => unreachable!("op checked in next()"),
        }
    }

    async fn get(&self, id: &str) -> Result<R, ProviderError> {
        match self.next(Op::Get, format!("get {id}")).await {
            Expectation::Get { id: expected, response } => {
                assert_eq!(expected, id, "get called with unexpected id");
                response
            }
            _ => unreachable!("op checked in next()"),
        }
    }

    async fn create(&self, _input: R::Create) -> Result<R, ProviderError> {
        match self.next(Op::Create, "create".to_string()).await {
            Expectation::Create { response } => response,
            _ => unreachable!("op checked in next()"),
        }
    }

    async fn update(&self, id: &str, _input: R::Update) -> Result<R, ProviderError> {
        match self.next(Op::Update, format!("update {id}")).await {
            Expectation::Update { id: expected, response } => {
                assert_eq!(expected, id, "update called with unexpected id");
                response
            }
            _ => unreachable!("op checked in next()"),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        match self.next(Op::Delete, format!("delete {id}")).await {
            Expectation::Delete { id: expected, response } => {
                assert_eq!(expected, id, "delete called with unexpected id");
                response
            }
            _ => unreachable!("op checked in next()"),
        }
    }
}

/// Builder for one expectation. `T` is the operation's success type.
pub struct ExpectationBuilder<R: Resource, T> {
    op: Op,
    id: String,
    delay: Option<Duration>,
    expectations: Queue<R>,
    _response: PhantomData<T>,
}

impl<R: Resource, T> ExpectationBuilder<R, T> {
    /// Holds the response back for `delay`, to simulate a slow request.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(self, expectation: Expectation<R>) {
        self.expectations.lock().unwrap().push_back(Scripted {
            expectation,
            delay: self.delay,
        });
    }
}

impl<R: Resource> ExpectationBuilder<R, Page<R>> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, page: Page<R>) {
        self.push(Expectation::List { response: Ok(page) });
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: ProviderError) {
        self.push(Expectation::List { response: Err(error) });
    }
}

impl<R: Resource> ExpectationBuilder<R, R> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, item: R) {
        self.respond(Ok(item));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: ProviderError) {
        self.respond(Err(error));
    }

    fn respond(self, response: Result<R, ProviderError>) {
        let id = self.id.clone();
        let expectation = match self.op {
            Op::Get => Expectation::Get { id, response },
            Op::Update => Expectation::Update { id, response },
            _ => Expectation::Create { response },
        };
        self.push(expectation);
    }
}

impl<R: Resource> ExpectationBuilder<R, ()> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self) {
        let id = self.id.clone();
        self.push(Expectation::Delete { id, response: Ok(()) });
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: ProviderError) {
        let id = self.id.clone();
        self.push(Expectation::Delete { id, response: Err(error) });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixtures;

    #[tokio::test]
    async fn test_mock_provider_with_expectations() {
        let obras = fixtures::obras();
        let mock = MockProvider::<crate::model::Obra>::new();

        // Set up expectations
        mock.expect_list()
            .return_ok(Page::new(obras.clone(), obras.len() as u64, 1, 50));
        mock.expect_get("obra-227").return_ok(obras[0].clone());
        mock.expect_delete("obra-227")
            .return_err(ProviderError::NotFound("obras/obra-227".into()));

        let provider: Arc<dyn ResourceProvider<crate::model::Obra>> = mock.clone();

        // Execute operations
        let page = provider.list(&ListParams::new()).await.unwrap();
        assert_eq!(page.data.len(), obras.len());

        let obra = provider.get("obra-227").await.unwrap();
        assert_eq!(obra.id, "obra-227");

        let err = provider.delete("obra-227").await.unwrap_err();
        assert!(err.is_not_found());

        // Verify all expectations were met
        mock.verify();
        assert_eq!(mock.calls(), vec!["list", "get obra-227", "delete obra-227"]);
    }

    #[tokio::test]
    #[should_panic(expected = "Expectation mismatch")]
    async fn test_mock_provider_rejects_out_of_order_calls() {
        let mock = MockProvider::<crate::model::Obra>::new();
        mock.expect_get("obra-227").return_err(ProviderError::StoreClosed);
        let _ = mock.list(&ListParams::new()).await;
    }
}
