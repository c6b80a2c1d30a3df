//! # Provider interface
//!
//! [`ResourceProvider`] is the capability interface a view's data layer talks to: one
//! `list/get/create/update/delete` set per entity. It is implemented once over HTTP
//! ([`HttpProvider`](crate::adapters::HttpProvider)) and once over the in-memory stores
//! ([`MemoryProvider`](crate::adapters::MemoryProvider)).
//!
//! [`DataProvider`] bundles one provider per entity. It is built once at startup by
//! [`ErpSystem`](crate::lifecycle::ErpSystem) and handed to every query and mutation, so there is
//! no process-wide provider singleton.

use crate::framework::{ListParams, Page, ProviderError, Resource};
use crate::model::{
    BankTransaction, BankTransactionCreate, BankTransactionMatch, DashboardGlobal, Destajo, EstadoRequisiciones,
    MetricasObra, Obra, OrdenCompra, Pago, Proveedor, Requisicion, ResumenProveedor,
};
use async_trait::async_trait;
use paste::paste;
use std::sync::Arc;

/// CRUD operations for one resource type.
#[async_trait]
pub trait ResourceProvider<R: Resource>: Send + Sync {
    async fn list(&self, params: &ListParams) -> Result<Page<R>, ProviderError>;

    async fn get(&self, id: &str) -> Result<R, ProviderError>;

    async fn create(&self, input: R::Create) -> Result<R, ProviderError>;

    async fn update(&self, id: &str, input: R::Update) -> Result<R, ProviderError>;

    async fn delete(&self, id: &str) -> Result<(), ProviderError>;
}

/// Dashboard read models that are not plain CRUD resources.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn obra_metrics(&self, obra_id: &str) -> Result<MetricasObra, ProviderError>;

    /// [`MetricasObra`] for every obra, in list order.
    async fn all_obra_metrics(&self) -> Result<Vec<MetricasObra>, ProviderError>;

    async fn proveedor_summary(&self, proveedor_id: &str) -> Result<ResumenProveedor, ProviderError>;

    /// One row per obra, or only `obra_id`'s row when given.
    async fn requisiciones_status(&self, obra_id: Option<&str>) -> Result<Vec<EstadoRequisiciones>, ProviderError>;

    async fn global_dashboard(&self) -> Result<DashboardGlobal, ProviderError>;
}

/// Bank reconciliation: imported statement lines and their match to purchase orders.
#[async_trait]
pub trait BankTransactionProvider: Send + Sync {
    /// Newest first (`fecha`, then `created_at`). `matched` filters when given.
    async fn list(&self, matched: Option<bool>) -> Result<Vec<BankTransaction>, ProviderError>;

    /// Inserts the whole batch or nothing, returning the stored rows in input order.
    async fn import(&self, items: Vec<BankTransactionCreate>) -> Result<Vec<BankTransaction>, ProviderError>;

    async fn match_transaction(&self, id: &str, data: BankTransactionMatch) -> Result<BankTransaction, ProviderError>;
}

/// Resources that can be looked up in a [`DataProvider`] by type.
pub trait Provided: Resource {
    fn select(provider: &DataProvider) -> Arc<dyn ResourceProvider<Self>>;
}

macro_rules! data_provider {
    ($($field:ident: $ty:ty),* $(,)?) => {
        paste! {
            /// The active set of providers, one per entity.
            ///
            /// Cloning is cheap: every field is an `Arc`.
            #[derive(Clone)]
            pub struct DataProvider {
                $( $field: Arc<dyn ResourceProvider<$ty>>, )*
                metrics: Arc<dyn MetricsProvider>,
                bank_transactions: Arc<dyn BankTransactionProvider>,
            }

            impl DataProvider {
                #[allow(clippy::too_many_arguments)]
                pub fn new(
                    $( $field: Arc<dyn ResourceProvider<$ty>>, )*
                    metrics: Arc<dyn MetricsProvider>,
                    bank_transactions: Arc<dyn BankTransactionProvider>,
                ) -> Self {
                    Self { $( $field, )* metrics, bank_transactions }
                }

                $(
                    pub fn $field(&self) -> Arc<dyn ResourceProvider<$ty>> {
                        self.$field.clone()
                    }

                    /// Replaces this entity's provider, keeping the others.
                    pub fn [<with_ $field>](mut self, provider: Arc<dyn ResourceProvider<$ty>>) -> Self {
                        self.$field = provider;
                        self
                    }
                )*

                pub fn metrics(&self) -> Arc<dyn MetricsProvider> {
                    self.metrics.clone()
                }

                pub fn with_metrics(mut self, metrics: Arc<dyn MetricsProvider>) -> Self {
                    self.metrics = metrics;
                    self
                }

                pub fn bank_transactions(&self) -> Arc<dyn BankTransactionProvider> {
                    self.bank_transactions.clone()
                }

                /// Generic accessor: `provider.resource::<Obra>()`.
                pub fn resource<R: Provided>(&self) -> Arc<dyn ResourceProvider<R>> {
                    R::select(self)
                }
            }

            $(
                impl Provided for $ty {
                    fn select(provider: &DataProvider) -> Arc<dyn ResourceProvider<Self>> {
                        provider.$field.clone()
                    }
                }
            )*
        }
    };
}

data_provider! {
    obras: Obra,
    proveedores: Proveedor,
    requisiciones: Requisicion,
    ordenes_compra: OrdenCompra,
    pagos: Pago,
    destajos: Destajo,
}
