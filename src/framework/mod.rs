//! Generic data-access layer shared by every entity.
//!
//! # Main Components
//!
//! - [`Resource`] - Trait that backend entities implement
//! - [`ResourceProvider`] - CRUD capability interface, one per entity
//! - [`DataProvider`] - The injected bundle of providers
//! - [`ResourceStore`] / [`StoreClient`] - In-memory store task and its handle
//! - [`ProviderError`] - Common error type
//!
//! # Testing
//!
//! See [`mock`] module for a scripted provider to test queries without a backend.

pub mod error;
pub mod mock;
pub mod provider;
pub mod resource;
pub mod store;

pub use error::ProviderError;
pub use provider::{BankTransactionProvider, DataProvider, MetricsProvider, Provided, ResourceProvider};
pub use resource::{to_snake_case, FilterValue, ListParams, Page, Resource, SortOrder};
pub use store::{ResourceStore, StoreClient, StoreEntity, StoreRequest};
