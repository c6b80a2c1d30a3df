use crate::adapters::{
    fixtures, ApiClient, ApiClientError, HttpBankTransactions, HttpMetrics, HttpProvider, MemoryBankTransactions,
    MemoryMetrics, MemoryProvider, OrdenCompraDeps, Simulation,
};
use crate::config::{Config, ConfigError, DataMode, MockMode};
use crate::framework::{
    DataProvider, ListParams, Provided, ProviderError, Resource, ResourceStore, StoreClient, StoreEntity,
};
use crate::hooks::{ItemQuery, ListQuery, Mutation, QueryCache, QueryOptions};
use crate::model::{
    BankTransaction, BankTransactionCreate, DashboardGlobal, Destajo, MetricasObra, Obra, OrdenCompra, Pago, Proveedor,
    Requisicion,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

const STORE_BUFFER: usize = 32;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiClientError),

    #[error("Store task failed: {0}")]
    StoreTask(String),

    #[error("Stores did not stop within {0:?}; drop every query and mutation before shutdown")]
    ShutdownTimeout(Duration),
}

/// The runtime orchestrator: picks the provider implementation once and hands it to every
/// query and mutation.
///
/// `ErpSystem` is responsible for:
/// - **Provider Selection**: `mock` mode wires in-memory stores, `api` mode the HTTP adapter
/// - **Dependency Wiring**: stores that validate against other stores get their clients
/// - **Shared Query State**: one [`QueryCache`] and loading policy for every query it builds
///
/// # Example
///
/// ```ignore
/// let system = ErpSystem::start(&Config::from_env()?)?;
///
/// let obras = system.list::<Obra>(ListParams::new());
/// obras.activate().await;
///
/// let crear = system.create_mutation::<Pago>();
/// crear.mutate(pago).await;
///
/// drop((obras, crear));
/// system.shutdown().await?;
/// ```
pub struct ErpSystem {
    provider: DataProvider,
    options: QueryOptions,
    mode: DataMode,
    /// Store tasks, empty in `api` mode.
    handles: Vec<JoinHandle<()>>,
}

impl ErpSystem {
    /// Builds the providers selected by `config`. Must run inside a Tokio runtime.
    pub fn start(config: &Config) -> Result<Self, SystemError> {
        config.validate()?;
        let options = QueryOptions {
            loading: config.loading_policy(),
            cache: Some(QueryCache::default()),
        };
        let system = match config.data_mode {
            DataMode::Mock => Self::start_memory(config, options),
            DataMode::Api => Self::start_api(config, options)?,
        };
        info!(mode = ?system.mode, stores = system.handles.len(), "System started");
        Ok(system)
    }

    fn start_api(config: &Config, options: QueryOptions) -> Result<Self, SystemError> {
        let api = ApiClient::new(&config.api.base_url, config.api_timeout())?;
        let page_size = config.ui.default_page_size;
        info!(base_url = %api.base_url(), page_size, "Using HTTP provider");
        let provider = DataProvider::new(
            Arc::new(http_provider::<Obra>(&api, page_size)),
            Arc::new(http_provider::<Proveedor>(&api, page_size)),
            Arc::new(http_provider::<Requisicion>(&api, page_size)),
            Arc::new(http_provider::<OrdenCompra>(&api, page_size)),
            Arc::new(http_provider::<Pago>(&api, page_size)),
            Arc::new(http_provider::<Destajo>(&api, page_size)),
            Arc::new(HttpMetrics::new(api.clone())),
            Arc::new(HttpBankTransactions::new(api)),
        );
        Ok(Self {
            provider,
            options,
            mode: DataMode::Api,
            handles: Vec::new(),
        })
    }

    fn start_memory(config: &Config, options: QueryOptions) -> Self {
        let seed = config.mock.mode != MockMode::Empty;
        let page_size = config.ui.default_page_size;
        let simulation = Simulation::from_config(&config.mock);
        info!(mode = ?config.mock.mode, seed, "Using in-memory provider");

        let mut handles = Vec::new();

        // 1. Stores without dependencies
        let obras = spawn_store(&mut handles, page_size, seed.then(fixtures::obras), ());
        let proveedores = spawn_store(&mut handles, page_size, seed.then(fixtures::proveedores), ());

        // 2. Stores that validate against other stores
        let requisiciones = spawn_store(
            &mut handles,
            page_size,
            seed.then(fixtures::requisiciones),
            obras.clone(),
        );
        let ordenes = spawn_store(
            &mut handles,
            page_size,
            seed.then(fixtures::ordenes_compra),
            OrdenCompraDeps {
                obras: obras.clone(),
                proveedores: proveedores.clone(),
            },
        );
        let pagos = spawn_store(&mut handles, page_size, seed.then(fixtures::pagos), ordenes.clone());
        let destajos = spawn_store(&mut handles, page_size, seed.then(fixtures::destajos), obras.clone());
        let movimientos = spawn_store(
            &mut handles,
            page_size,
            seed.then(fixtures::bank_transactions),
            ordenes.clone(),
        );

        let metrics = MemoryMetrics::new(
            obras.clone(),
            proveedores.clone(),
            requisiciones.clone(),
            ordenes.clone(),
            pagos.clone(),
            simulation,
        );
        let bank_transactions = MemoryBankTransactions::new(movimientos, ordenes.clone(), simulation);
        let provider = DataProvider::new(
            Arc::new(MemoryProvider::new(obras, simulation)),
            Arc::new(MemoryProvider::new(proveedores, simulation)),
            Arc::new(MemoryProvider::new(requisiciones, simulation)),
            Arc::new(MemoryProvider::new(ordenes, simulation)),
            Arc::new(MemoryProvider::new(pagos, simulation)),
            Arc::new(MemoryProvider::new(destajos, simulation)),
            Arc::new(metrics),
            Arc::new(bank_transactions),
        );

        Self {
            provider,
            options,
            mode: DataMode::Mock,
            handles,
        }
    }

    pub fn provider(&self) -> &DataProvider {
        &self.provider
    }

    pub fn mode(&self) -> DataMode {
        self.mode
    }

    pub fn cache(&self) -> Option<&QueryCache> {
        self.options.cache.as_ref()
    }

    pub fn query_options(&self) -> QueryOptions {
        self.options.clone()
    }

    pub fn list<R: Provided>(&self, params: ListParams) -> ListQuery<R> {
        ListQuery::with_options(self.provider.resource::<R>(), params, self.query_options())
    }

    pub fn item<R: Provided>(&self, id: impl Into<String>) -> ItemQuery<R> {
        ItemQuery::with_options(self.provider.resource::<R>(), id, self.query_options())
    }

    pub fn create_mutation<R: Provided>(&self) -> Mutation<R::Create, R> {
        self.with_cache(Mutation::create(self.provider.resource::<R>()))
    }

    pub fn update_mutation<R: Provided>(&self) -> Mutation<(String, R::Update), R> {
        self.with_cache(Mutation::update(self.provider.resource::<R>()))
    }

    pub fn delete_mutation<R: Provided>(&self) -> Mutation<String, ()> {
        self.with_cache(Mutation::delete(self.provider.resource::<R>()))
    }

    fn with_cache<I: Send + 'static, O: Send + 'static>(&self, mutation: Mutation<I, O>) -> Mutation<I, O> {
        match &self.options.cache {
            Some(cache) => mutation.with_cache(cache.clone()),
            None => mutation,
        }
    }

    pub async fn obra_metrics(&self, obra_id: &str) -> Result<MetricasObra, ProviderError> {
        self.provider.metrics().obra_metrics(obra_id).await
    }

    pub async fn global_dashboard(&self) -> Result<DashboardGlobal, ProviderError> {
        self.provider.metrics().global_dashboard().await
    }

    /// Imports a bank statement batch.
    pub async fn import_bank_transactions(
        &self,
        items: Vec<BankTransactionCreate>,
    ) -> Result<Vec<BankTransaction>, ProviderError> {
        let inserted = self.provider.bank_transactions().import(items).await?;
        info!(count = inserted.len(), "Bank transactions imported");
        Ok(inserted)
    }

    /// Gracefully shuts down the system.
    ///
    /// Dropping the provider closes the store channels; each store exits its loop once every
    /// client (including those held by dependent stores) is gone. Queries and mutations hold
    /// provider clones, so drop them first.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down system...");
        drop(self.provider);
        drop(self.options);

        for handle in self.handles {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!("Store task failed: {:?}", e);
                    return Err(SystemError::StoreTask(e.to_string()));
                }
                Err(_) => {
                    error!(timeout = ?SHUTDOWN_TIMEOUT, "Store did not stop");
                    return Err(SystemError::ShutdownTimeout(SHUTDOWN_TIMEOUT));
                }
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}

fn http_provider<R: Resource>(api: &ApiClient, page_size: u32) -> HttpProvider<R> {
    HttpProvider::new(api.clone()).with_default_page_size(page_size)
}

fn spawn_store<T: StoreEntity>(
    handles: &mut Vec<JoinHandle<()>>,
    page_size: u32,
    records: Option<Vec<T>>,
    context: T::Context,
) -> StoreClient<T>
where
    T::Context: 'static,
{
    let (store, client) = ResourceStore::<T>::new(STORE_BUFFER, page_size);
    let store = store.with_records(records.unwrap_or_default());
    handles.push(tokio::spawn(store.run(context)));
    client
}

