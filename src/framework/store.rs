//! # In-memory Resource Store
//!
//! The backing store of the in-memory adapter. Each entity type gets its own
//! [`ResourceStore`] running in a Tokio task; [`StoreClient`] is the cloneable handle used to
//! talk to it.
//!
//! ## Key Types
//!
//! - [`StoreEntity`]: the hooks an entity implements to be stored (construction, validation,
//!   updates).
//! - [`ResourceStore`]: the task that owns the records.
//! - [`StoreClient`]: typed request/response handle.
//!
//! Each store processes its requests sequentially, so the record map needs no lock. Cross-entity
//! preconditions (a purchase order needs an existing supplier) are checked in
//! [`StoreEntity::on_create`] with clients of the other stores, injected through
//! [`ResourceStore::run`].

use crate::framework::{to_snake_case, ListParams, Page, ProviderError, Resource, SortOrder};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Hooks an entity implements to be kept in a [`ResourceStore`].
///
/// # Async & Context
/// `on_create` and `on_delete` are async so they can query other stores. The `Context` type
/// holds those dependencies; use `()` when there are none.
#[async_trait]
pub trait StoreEntity: Resource {
    /// Clients of other stores this entity validates against.
    type Context: Send + Sync;

    /// Builds the full record from the server-assigned id and the create payload.
    /// Shape validation (non-empty fields, positive amounts) happens here.
    fn from_create(id: String, now: DateTime<Utc>, params: Self::Create) -> Result<Self, String>;

    /// Cross-entity preconditions, checked after `from_create` and before insertion.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), String> {
        Ok(())
    }

    /// Merges an update payload into the record.
    fn apply_update(&mut self, update: Self::Update, now: DateTime<Utc>) -> Result<(), String>;

    /// Called before the record is removed.
    async fn on_delete(&self, _ctx: &Self::Context) -> Result<(), String> {
        Ok(())
    }
}

/// Type alias for the one-shot response channel used by stores.
pub type Response<T> = oneshot::Sender<Result<T, ProviderError>>;

/// Request sent to a [`ResourceStore`]. One variant per provider operation.
#[derive(Debug)]
pub enum StoreRequest<T: StoreEntity> {
    List {
        params: ListParams,
        respond_to: Response<Page<T>>,
    },
    Get {
        id: String,
        respond_to: Response<Option<T>>,
    },
    Create {
        params: T::Create,
        respond_to: Response<T>,
    },
    Update {
        id: String,
        update: T::Update,
        respond_to: Response<T>,
    },
    Delete {
        id: String,
        respond_to: Response<()>,
    },
}

/// Task that owns the records of one entity type.
///
/// Records are kept in a `HashMap` plus an insertion-order index, so unsorted lists come back
/// in the order the fixtures were seeded and records were created.
pub struct ResourceStore<T: StoreEntity> {
    receiver: mpsc::Receiver<StoreRequest<T>>,
    records: HashMap<String, T>,
    order: Vec<String>,
    default_page_size: u32,
}

impl<T: StoreEntity> ResourceStore<T> {
    pub fn new(buffer_size: usize, default_page_size: u32) -> (Self, StoreClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let store = Self {
            receiver,
            records: HashMap::new(),
            order: Vec::new(),
            default_page_size: default_page_size.max(1),
        };
        (store, StoreClient::new(sender))
    }

    /// Seeds the store with fixture records before it starts.
    pub fn with_records(mut self, records: impl IntoIterator<Item = T>) -> Self {
        for record in records {
            self.insert(record);
        }
        self
    }

    fn insert(&mut self, record: T) {
        let id = record.id().to_string();
        if self.records.insert(id.clone(), record).is_none() {
            self.order.push(id);
        }
    }

    /// Runs the store's loop until every client has been dropped.
    ///
    /// # Context Injection
    /// `context` is passed to every hook, so dependencies created after [`ResourceStore::new`]
    /// can still be wired in.
    pub async fn run(mut self, context: T::Context) {
        let resource = T::PATH;
        info!(resource, size = self.records.len(), "Store started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::List { params, respond_to } => {
                    let page = self.select(&params);
                    debug!(resource, ?params, total = page.total, "List");
                    let _ = respond_to.send(Ok(page));
                }
                StoreRequest::Get { id, respond_to } => {
                    let item = self.records.get(&id).cloned();
                    debug!(resource, %id, found = item.is_some(), "Get");
                    let _ = respond_to.send(Ok(item));
                }
                StoreRequest::Create { params, respond_to } => {
                    debug!(resource, ?params, "Create");
                    let id = uuid::Uuid::new_v4().to_string();
                    let mut item = match T::from_create(id.clone(), Utc::now(), params) {
                        Ok(item) => item,
                        Err(e) => {
                            warn!(resource, error = %e, "Create failed");
                            let _ = respond_to.send(Err(ProviderError::Validation(e)));
                            continue;
                        }
                    };
                    if let Err(e) = item.on_create(&context).await {
                        warn!(resource, error = %e, "on_create failed");
                        let _ = respond_to.send(Err(ProviderError::Validation(e)));
                        continue;
                    }
                    self.insert(item.clone());
                    info!(resource, %id, size = self.records.len(), "Created");
                    let _ = respond_to.send(Ok(item));
                }
                StoreRequest::Update { id, update, respond_to } => {
                    debug!(resource, %id, ?update, "Update");
                    let Some(item) = self.records.get_mut(&id) else {
                        warn!(resource, %id, "Not found");
                        let _ = respond_to.send(Err(not_found::<T>(&id)));
                        continue;
                    };
                    // Work on a copy so a rejected update leaves the record untouched.
                    let mut updated = item.clone();
                    match updated.apply_update(update, Utc::now()) {
                        Ok(()) => {
                            *item = updated.clone();
                            info!(resource, %id, "Updated");
                            let _ = respond_to.send(Ok(updated));
                        }
                        Err(e) => {
                            warn!(resource, %id, error = %e, "Update failed");
                            let _ = respond_to.send(Err(ProviderError::Validation(e)));
                        }
                    }
                }
                StoreRequest::Delete { id, respond_to } => {
                    debug!(resource, %id, "Delete");
                    let Some(item) = self.records.get(&id) else {
                        warn!(resource, %id, "Not found");
                        let _ = respond_to.send(Err(not_found::<T>(&id)));
                        continue;
                    };
                    if let Err(e) = item.on_delete(&context).await {
                        warn!(resource, %id, error = %e, "on_delete failed");
                        let _ = respond_to.send(Err(ProviderError::Validation(e)));
                        continue;
                    }
                    self.records.remove(&id);
                    self.order.retain(|existing| existing != &id);
                    info!(resource, %id, size = self.records.len(), "Deleted");
                    let _ = respond_to.send(Ok(()));
                }
            }
        }

        info!(resource, size = self.records.len(), "Shutdown");
    }

    /// Filter, then sort, then paginate.
    fn select(&self, params: &ListParams) -> Page<T> {
        let mut rows: Vec<(Value, &T)> = self
            .order
            .iter()
            .filter_map(|id| self.records.get(id))
            .map(|record| (serde_json::to_value(record).unwrap_or(Value::Null), record))
            .filter(|(json, _)| matches_filters(json, params))
            .collect();

        if let Some(sort_by) = &params.sort_by {
            let key = to_snake_case(sort_by);
            let desc = params.sort_order == Some(SortOrder::Desc);
            rows.sort_by(|(a, _), (b, _)| {
                let ord = compare_values(a.get(&key), b.get(&key));
                if desc {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        let page = params.page.unwrap_or(1).max(1);
        let page_size = params.page_size.unwrap_or(self.default_page_size).max(1);
        let total = rows.len() as u64;
        let start = (page as u64 - 1).saturating_mul(page_size as u64);
        let data = rows
            .into_iter()
            .skip(usize::try_from(start).unwrap_or(usize::MAX))
            .take(page_size as usize)
            .map(|(_, record)| record.clone())
            .collect();

        Page::new(data, total, page, page_size)
    }
}

fn not_found<T: Resource>(id: &str) -> ProviderError {
    ProviderError::NotFound(format!("{}/{}", T::PATH, id))
}

fn matches_filters(record: &Value, params: &ListParams) -> bool {
    params.filters.iter().all(|(key, value)| {
        let expected = value.to_json();
        if expected.is_null() {
            return true;
        }
        match record.get(to_snake_case(key)) {
            Some(actual) => values_equal(actual, &expected),
            None => false,
        }
    })
}

// JSON numbers only compare equal when they share a representation, so 5 and 5.0 need help.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Cloneable handle to a [`ResourceStore`].
#[derive(Debug, Clone)]
pub struct StoreClient<T: StoreEntity> {
    sender: mpsc::Sender<StoreRequest<T>>,
}

impl<T: StoreEntity> StoreClient<T> {
    pub fn new(sender: mpsc::Sender<StoreRequest<T>>) -> Self {
        Self { sender }
    }

    pub async fn list(&self, params: ListParams) -> Result<Page<T>, ProviderError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::List { params, respond_to })
            .await
            .map_err(|_| ProviderError::StoreClosed)?;
        response.await.map_err(|_| ProviderError::StoreDropped)?
    }

    pub async fn get(&self, id: impl Into<String>) -> Result<Option<T>, ProviderError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Get { id: id.into(), respond_to })
            .await
            .map_err(|_| ProviderError::StoreClosed)?;
        response.await.map_err(|_| ProviderError::StoreDropped)?
    }

    pub async fn create(&self, params: T::Create) -> Result<T, ProviderError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Create { params, respond_to })
            .await
            .map_err(|_| ProviderError::StoreClosed)?;
        response.await.map_err(|_| ProviderError::StoreDropped)?
    }

    pub async fn update(&self, id: impl Into<String>, update: T::Update) -> Result<T, ProviderError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Update {
                id: id.into(),
                update,
                respond_to,
            })
            .await
            .map_err(|_| ProviderError::StoreClosed)?;
        response.await.map_err(|_| ProviderError::StoreDropped)?
    }

    pub async fn delete(&self, id: impl Into<String>) -> Result<(), ProviderError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Delete { id: id.into(), respond_to })
            .await
            .map_err(|_| ProviderError::StoreClosed)?;
        response.await.map_err(|_| ProviderError::StoreDropped)?
    }

    /// Existence check used by `on_create` hooks of dependent entities.
    pub async fn require(&self, id: &str) -> Result<T, String> {
        match self.get(id).await {
            Ok(Some(item)) => Ok(item),
            Ok(None) => Err(format!("{} {} does not exist", T::PATH, id)),
            Err(e) => Err(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    // --- Domain Definition ---

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Material {
        id: String,
        nombre: String,
        precio: f64,
        activo: bool,
        updated_at: DateTime<Utc>,
    }

    #[derive(Clone, Debug, Serialize)]
    struct MaterialCreate {
        nombre: String,
        precio: f64,
    }

    #[derive(Clone, Debug, Serialize)]
    struct MaterialUpdate {
        precio: Option<f64>,
    }

    impl Resource for Material {
        const PATH: &'static str = "materiales";
        type Create = MaterialCreate;
        type Update = MaterialUpdate;

        fn id(&self) -> &str {
            &self.id
        }
    }

    #[async_trait]
    impl StoreEntity for Material {
        type Context = ();

        fn from_create(id: String, now: DateTime<Utc>, params: MaterialCreate) -> Result<Self, String> {
            if params.precio < 0.0 {
                return Err("precio must not be negative".to_string());
            }
            Ok(Self {
                id,
                nombre: params.nombre,
                precio: params.precio,
                activo: true,
                updated_at: now,
            })
        }

        fn apply_update(&mut self, update: MaterialUpdate, now: DateTime<Utc>) -> Result<(), String> {
            if let Some(precio) = update.precio {
                if precio < 0.0 {
                    return Err("precio must not be negative".to_string());
                }
                self.precio = precio;
            }
            self.updated_at = now;
            Ok(())
        }
    }

    fn material(id: &str, nombre: &str, precio: f64, activo: bool) -> Material {
        Material {
            id: id.to_string(),
            nombre: nombre.to_string(),
            precio,
            activo,
            updated_at: Utc::now(),
        }
    }

    fn seeded() -> StoreClient<Material> {
        let (store, client) = ResourceStore::new(8, 2);
        let store = store.with_records(vec![
            material("m1", "Cemento", 250.0, true),
            material("m2", "Arena", 90.0, true),
            material("m3", "Varilla", 180.0, false),
        ]);
        tokio::spawn(store.run(()));
        client
    }

    // --- Tests ---

    #[tokio::test]
    async fn test_list_paginates_with_default_page_size() {
        let client = seeded();

        let first = client.list(ListParams::new()).await.unwrap();
        assert_eq!(first.total, 3);
        assert_eq!(first.page_size, 2);
        assert_eq!(first.total_pages, 2);
        let ids: Vec<_> = first.data.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);

        let second = client.list(ListParams::new().page(2)).await.unwrap();
        assert_eq!(second.data.len(), 1);
        assert_eq!(second.data[0].id, "m3");
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let client = seeded();

        let active = client
            .list(ListParams::new().filter("activo", true).sort_by("precio", SortOrder::Desc))
            .await
            .unwrap();
        let names: Vec<_> = active.data.iter().map(|m| m.nombre.as_str()).collect();
        assert_eq!(names, vec!["Cemento", "Arena"]);

        let by_price = client
            .list(ListParams::new().filter("precio", 90_i64))
            .await
            .unwrap();
        assert_eq!(by_price.total, 1);
        assert_eq!(by_price.data[0].id, "m2");

        let by_name = client
            .list(ListParams::new().page_size(10).sort_by("nombre", SortOrder::Asc))
            .await
            .unwrap();
        let names: Vec<_> = by_name.data.iter().map(|m| m.nombre.as_str()).collect();
        assert_eq!(names, vec!["Arena", "Cemento", "Varilla"]);
    }

    #[tokio::test]
    async fn test_crud_lifecycle() {
        let client = seeded();

        let created = client
            .create(MaterialCreate { nombre: "Grava".into(), precio: 120.0 })
            .await
            .unwrap();
        assert!(!created.id.is_empty());
        assert_eq!(client.get(created.id.clone()).await.unwrap(), Some(created.clone()));

        let updated = client
            .update(created.id.clone(), MaterialUpdate { precio: Some(130.0) })
            .await
            .unwrap();
        assert_eq!(updated.precio, 130.0);

        client.delete(created.id.clone()).await.unwrap();
        assert_eq!(client.get(created.id.clone()).await.unwrap(), None);
        assert!(client.delete(created.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_validation_errors_leave_store_untouched() {
        let client = seeded();

        let err = client
            .create(MaterialCreate { nombre: "Mal".into(), precio: -1.0 })
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));

        let err = client
            .update("m1", MaterialUpdate { precio: Some(-5.0) })
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
        assert_eq!(client.get("m1").await.unwrap().unwrap().precio, 250.0);

        let total = client.list(ListParams::new()).await.unwrap().total;
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_require_reports_missing_records() {
        let client = seeded();
        assert!(client.require("m1").await.is_ok());
        let err = client.require("nope").await.unwrap_err();
        assert_eq!(err, "materiales nope does not exist");
    }
}
