//! # In-memory adapter
//!
//! [`MemoryProvider`] serves a [`ResourceProvider`] from a [`ResourceStore`](crate::framework::ResourceStore)
//! task, so every view works without a backend. A [`Simulation`] layered on top reproduces
//! network conditions for development:
//!
//! - [`MockMode::WithData`] / [`MockMode::Empty`]: normal behavior (the stores are seeded or not).
//! - [`MockMode::Error`]: every call fails after the delay.
//! - [`MockMode::Loading`]: calls never resolve.
//!
//! Optional latency is drawn uniformly from the configured range on every call.

pub mod entities;
pub mod fixtures;

use crate::config::{MockConfig, MockMode};
use crate::framework::{
    BankTransactionProvider, ListParams, MetricsProvider, Page, ProviderError, Resource, ResourceProvider,
    StoreClient, StoreEntity,
};
use crate::model::{
    BankTransaction, BankTransactionCreate, BankTransactionMatch, DashboardGlobal, EstadoRequisiciones, MetricasObra,
    Obra, OrdenCompra, Pago, Proveedor, Requisicion, ResumenProveedor,
};
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, instrument};

pub use entities::OrdenCompraDeps;

/// Simulated network conditions shared by every in-memory provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Simulation {
    pub mode: MockMode,
    pub delay: Option<(Duration, Duration)>,
}

impl Simulation {
    /// No latency, no injected failures.
    pub fn instant() -> Self {
        Self::default()
    }

    pub fn from_config(config: &MockConfig) -> Self {
        Self {
            mode: config.mode,
            delay: config.delay_range(),
        }
    }

    fn sample_delay(&self) -> Option<Duration> {
        let (min, max) = self.delay?;
        if max <= min {
            return Some(min);
        }
        Some(rand::thread_rng().gen_range(min..=max))
    }

    /// Runs before every operation. Returns the injected failure, or never returns in
    /// `loading` mode.
    async fn intercept(&self, resource: &str, op: &str) -> Result<(), ProviderError> {
        if self.mode == MockMode::Loading {
            debug!(resource, op, "Simulating a request that never completes");
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.sample_delay() {
            tokio::time::sleep(delay).await;
        }
        if self.mode == MockMode::Error {
            return Err(ProviderError::Simulated(format!(
                "Network error: could not reach the server ({op} {resource})"
            )));
        }
        Ok(())
    }
}

/// [`ResourceProvider`] backed by a [`StoreClient`].
pub struct MemoryProvider<R: StoreEntity> {
    store: StoreClient<R>,
    simulation: Simulation,
}

impl<R: StoreEntity> MemoryProvider<R> {
    pub fn new(store: StoreClient<R>, simulation: Simulation) -> Self {
        Self { store, simulation }
    }
}

#[async_trait]
impl<R: StoreEntity> ResourceProvider<R> for MemoryProvider<R> {
    #[instrument(skip(self), fields(resource = R::PATH))]
    async fn list(&self, params: &ListParams) -> Result<Page<R>, ProviderError> {
        self.simulation.intercept(R::PATH, "list").await?;
        self.store.list(params.clone()).await
    }

    #[instrument(skip(self), fields(resource = R::PATH))]
    async fn get(&self, id: &str) -> Result<R, ProviderError> {
        self.simulation.intercept(R::PATH, "get").await?;
        self.store
            .get(id)
            .await?
            .ok_or_else(|| not_found::<R>(id))
    }

    #[instrument(skip(self, input), fields(resource = R::PATH))]
    async fn create(&self, input: R::Create) -> Result<R, ProviderError> {
        self.simulation.intercept(R::PATH, "create").await?;
        self.store.create(input).await
    }

    #[instrument(skip(self, input), fields(resource = R::PATH))]
    async fn update(&self, id: &str, input: R::Update) -> Result<R, ProviderError> {
        self.simulation.intercept(R::PATH, "update").await?;
        self.store.update(id, input).await
    }

    #[instrument(skip(self), fields(resource = R::PATH))]
    async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        self.simulation.intercept(R::PATH, "delete").await?;
        self.store.delete(id).await
    }
}

/// Every row of a store, in insertion order.
fn everything() -> ListParams {
    ListParams::new().page_size(u32::MAX)
}

async fn all_rows<T: StoreEntity>(store: &StoreClient<T>) -> Result<Vec<T>, ProviderError> {
    Ok(store.list(everything()).await?.data)
}

fn not_found<T: Resource>(id: &str) -> ProviderError {
    ProviderError::NotFound(format!("{}/{}", T::PATH, id))
}

/// [`MetricsProvider`] computed from the in-memory stores.
pub struct MemoryMetrics {
    obras: StoreClient<Obra>,
    proveedores: StoreClient<Proveedor>,
    requisiciones: StoreClient<Requisicion>,
    ordenes: StoreClient<OrdenCompra>,
    pagos: StoreClient<Pago>,
    simulation: Simulation,
}

impl MemoryMetrics {
    pub fn new(
        obras: StoreClient<Obra>,
        proveedores: StoreClient<Proveedor>,
        requisiciones: StoreClient<Requisicion>,
        ordenes: StoreClient<OrdenCompra>,
        pagos: StoreClient<Pago>,
        simulation: Simulation,
    ) -> Self {
        Self {
            obras,
            proveedores,
            requisiciones,
            ordenes,
            pagos,
            simulation,
        }
    }
}

#[async_trait]
impl MetricsProvider for MemoryMetrics {
    #[instrument(skip(self))]
    async fn obra_metrics(&self, obra_id: &str) -> Result<MetricasObra, ProviderError> {
        self.simulation.intercept("dashboard", "metricas").await?;
        let obra = self
            .obras
            .get(obra_id)
            .await?
            .ok_or_else(|| not_found::<Obra>(obra_id))?;
        let own = |id: &str| everything().filter("obra_id", id);
        let ordenes = self.ordenes.list(own(obra_id)).await?.data;
        let pagos = self.pagos.list(own(obra_id)).await?.data;
        Ok(MetricasObra::compute(&obra, &ordenes, &pagos))
    }

    #[instrument(skip(self))]
    async fn all_obra_metrics(&self) -> Result<Vec<MetricasObra>, ProviderError> {
        self.simulation.intercept("dashboard", "metricas").await?;
        let obras = all_rows(&self.obras).await?;
        let ordenes = all_rows(&self.ordenes).await?;
        let pagos = all_rows(&self.pagos).await?;
        Ok(obras
            .iter()
            .map(|obra| MetricasObra::compute(obra, &ordenes, &pagos))
            .collect())
    }

    #[instrument(skip(self))]
    async fn proveedor_summary(&self, proveedor_id: &str) -> Result<ResumenProveedor, ProviderError> {
        self.simulation.intercept("dashboard", "resumen proveedor").await?;
        let proveedor = self
            .proveedores
            .get(proveedor_id)
            .await?
            .ok_or_else(|| not_found::<Proveedor>(proveedor_id))?;
        let own = everything().filter("proveedor_id", proveedor_id);
        let ordenes = self.ordenes.list(own.clone()).await?.data;
        let pagos = self.pagos.list(own).await?.data;
        Ok(ResumenProveedor::compute(&proveedor, &ordenes, &pagos))
    }

    #[instrument(skip(self))]
    async fn requisiciones_status(&self, obra_id: Option<&str>) -> Result<Vec<EstadoRequisiciones>, ProviderError> {
        self.simulation.intercept("dashboard", "requisiciones").await?;
        let obras = match obra_id {
            Some(id) => vec![self.obras.get(id).await?.ok_or_else(|| not_found::<Obra>(id))?],
            None => all_rows(&self.obras).await?,
        };
        let requisiciones = match obra_id {
            Some(id) => self.requisiciones.list(everything().filter("obra_id", id)).await?.data,
            None => all_rows(&self.requisiciones).await?,
        };
        Ok(obras
            .iter()
            .map(|obra| EstadoRequisiciones::compute(obra, &requisiciones))
            .collect())
    }

    #[instrument(skip(self))]
    async fn global_dashboard(&self) -> Result<DashboardGlobal, ProviderError> {
        self.simulation.intercept("dashboard", "resumen").await?;
        let obras = all_rows(&self.obras).await?;
        let ordenes = all_rows(&self.ordenes).await?;
        let pagos = all_rows(&self.pagos).await?;
        let requisiciones = all_rows(&self.requisiciones).await?;
        Ok(DashboardGlobal::compute(&obras, &ordenes, &pagos, &requisiciones))
    }
}

/// [`BankTransactionProvider`] over a transaction store, checking purchase orders against the
/// ordenes store.
pub struct MemoryBankTransactions {
    store: StoreClient<BankTransaction>,
    ordenes: StoreClient<OrdenCompra>,
    simulation: Simulation,
}

impl MemoryBankTransactions {
    pub fn new(store: StoreClient<BankTransaction>, ordenes: StoreClient<OrdenCompra>, simulation: Simulation) -> Self {
        Self {
            store,
            ordenes,
            simulation,
        }
    }
}

#[async_trait]
impl BankTransactionProvider for MemoryBankTransactions {
    #[instrument(skip(self))]
    async fn list(&self, matched: Option<bool>) -> Result<Vec<BankTransaction>, ProviderError> {
        self.simulation.intercept(BankTransaction::PATH, "list").await?;
        let mut rows = self.store.list(everything().filter("matched", matched)).await?.data;
        rows.sort_by(|a, b| b.fecha.cmp(&a.fecha).then(b.created_at.cmp(&a.created_at)));
        Ok(rows)
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    async fn import(&self, items: Vec<BankTransactionCreate>) -> Result<Vec<BankTransaction>, ProviderError> {
        self.simulation.intercept(BankTransaction::PATH, "import").await?;
        // Check the whole batch first so a bad line leaves the store untouched.
        for (line, item) in items.iter().enumerate() {
            let invalid = |e: String| ProviderError::Validation(format!("line {}: {e}", line + 1));
            BankTransaction::from_create(String::new(), Utc::now(), item.clone()).map_err(invalid)?;
            if let Some(id) = &item.orden_compra_id {
                self.ordenes.require(id).await.map_err(invalid)?;
            }
        }
        let mut inserted = Vec::with_capacity(items.len());
        for item in items {
            inserted.push(self.store.create(item).await?);
        }
        debug!(count = inserted.len(), "Imported");
        Ok(inserted)
    }

    #[instrument(skip(self))]
    async fn match_transaction(&self, id: &str, data: BankTransactionMatch) -> Result<BankTransaction, ProviderError> {
        self.simulation.intercept(BankTransaction::PATH, "match").await?;
        if self.store.get(id).await?.is_none() {
            return Err(not_found::<BankTransaction>(id));
        }
        self.ordenes
            .require(&data.orden_compra_id)
            .await
            .map_err(ProviderError::Validation)?;
        self.store.update(id, data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::ResourceStore;
    use crate::model::ObraEstado;

    fn obras_provider(simulation: Simulation) -> MemoryProvider<Obra> {
        let (store, client) = ResourceStore::new(8, 50);
        tokio::spawn(store.with_records(fixtures::obras()).run(()));
        MemoryProvider::new(client, simulation)
    }

    #[tokio::test]
    async fn test_list_and_get_from_fixtures() {
        let provider = obras_provider(Simulation::instant());

        let page = provider
            .list(&ListParams::new().filter("estado", "activa"))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert!(page.data.iter().all(|o| o.estado == ObraEstado::Activa));

        let obra = provider.get("obra-415").await.unwrap();
        assert_eq!(obra.codigo, "415");

        let err = provider.get("obra-999").await.unwrap_err();
        assert_eq!(err, ProviderError::NotFound("obras/obra-999".into()));
    }

    #[tokio::test]
    async fn test_error_mode_fails_every_call() {
        let provider = obras_provider(Simulation {
            mode: MockMode::Error,
            delay: None,
        });
        let err = provider.list(&ListParams::new()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Simulated(_)));
        assert!(err.to_string().starts_with("Network error"));
    }

    #[tokio::test]
    async fn test_loading_mode_never_resolves() {
        let provider = obras_provider(Simulation {
            mode: MockMode::Loading,
            delay: None,
        });
        let result = tokio::time::timeout(Duration::from_millis(50), provider.get("obra-227")).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_stays_within_range() {
        let provider = obras_provider(Simulation {
            mode: MockMode::WithData,
            delay: Some((Duration::from_millis(200), Duration::from_millis(600))),
        });
        let started = tokio::time::Instant::now();
        provider.get("obra-227").await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed <= Duration::from_millis(700));
    }
}
