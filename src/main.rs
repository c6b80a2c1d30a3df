//! Demo: starts the data layer from the environment, loads the obras list and one dashboard,
//! and prints what each view would render.

use obra_data::config::Config;
use obra_data::framework::{ListParams, SortOrder};
use obra_data::hooks::ViewState;
use obra_data::lifecycle::tracing::setup_tracing;
use obra_data::lifecycle::ErpSystem;
use obra_data::model::{Obra, OrdenCompra};
use std::time::Duration;
use tracing::{error, info, warn, Instrument};

/// Upper bound for each demo load, so `ERP_MOCK_MODE=loading` still terminates.
const LOAD_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let config = match std::env::var("ERP_CONFIG") {
        Ok(path) => Config::load(path)?,
        Err(_) => Config::from_env()?,
    };
    info!(mode = ?config.data_mode, "Starting data layer");

    let system = ErpSystem::start(&config)?;

    let obras = system.list::<Obra>(ListParams::new().sort_by("nombre", SortOrder::Asc));
    let span = tracing::info_span!("obras_view");
    async {
        if tokio::time::timeout(LOAD_TIMEOUT, obras.activate()).await.is_err() {
            warn!("Obras still loading after {:?}", LOAD_TIMEOUT);
        }
        let state = obras.state();
        info!(view = %state.view_state(), rows = state.data.len(), "Rendered obras list");
        match state.view_state() {
            ViewState::Data => {
                for obra in &state.data {
                    info!(id = %obra.id, codigo = %obra.codigo, estado = ?obra.estado, "{}", obra.nombre);
                }
            }
            ViewState::Error => error!(error = state.error.as_deref().unwrap_or_default(), "Obras failed"),
            ViewState::Empty => info!("No obras registered"),
            ViewState::Loading => {}
        }
    }
    .instrument(span)
    .await;

    if let Some(obra) = obras.state().data.first() {
        let span = tracing::info_span!("dashboard", obra_id = %obra.id);
        async {
            let ordenes = system.list::<OrdenCompra>(ListParams::new().filter("obra_id", obra.id.as_str()));
            let _ = tokio::time::timeout(LOAD_TIMEOUT, ordenes.activate()).await;
            info!(view = %ordenes.state().view_state(), "Rendered ordenes de compra");

            match tokio::time::timeout(LOAD_TIMEOUT, system.obra_metrics(&obra.id)).await {
                Ok(Ok(m)) => info!(
                    comprometido = m.comprometido,
                    pagado = m.pagado,
                    saldo = m.saldo,
                    porcentaje_ejecutado = %format!("{:.2}", m.porcentaje_ejecutado),
                    "Metrics"
                ),
                Ok(Err(e)) => error!(error = %e, "Metrics failed"),
                Err(_) => warn!("Metrics still loading"),
            }
        }
        .instrument(span)
        .await;
    }

    drop(obras);
    system.shutdown().await?;

    info!("Demo completed");
    Ok(())
}
