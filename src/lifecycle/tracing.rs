//! # Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging with the `tracing` crate for the whole data
//! layer.
//!
//! ## Configuration
//!
//! The subscriber uses a compact format without the crate/module prefix (`with_target(false)`);
//! the `resource` field already says where a line comes from. Levels come from `RUST_LOG`.
//!
//! ## What Gets Traced
//!
//! - **Store Lifecycle**: startup, shutdown and record counts of each in-memory store
//! - **Provider Operations**: one span per `list/get/create/update/delete`, with `resource`
//! - **Queries**: fetch results, cache hits and discarded stale results (`seq`)
//! - **Errors**: HTTP status and server message, validation failures, simulated failures
//!
//! ## Usage Examples
//!
//! ```bash
//! # Compact logs (default)
//! RUST_LOG=info cargo run
//!
//! # Request URLs, payloads and query sequence numbers
//! RUST_LOG=debug cargo run
//!
//! # Only the query layer
//! RUST_LOG=obra_data::hooks=debug cargo run
//! ```
//!
//! ## Example Output
//!
//! **With `RUST_LOG=debug`**, creating a payment in mock mode:
//!
//! ```text
//! DEBUG create:Create params=PagoCreate { obra_id: "obra-227", orden_compra_id: "oc-002", monto: 50000.0, .. } resource="pagos"
//! DEBUG Get id=oc-002 found=true resource="ordenes-compra"
//! INFO Created id=6f1c... size=4 resource="pagos"
//! DEBUG Invalidated resource="pagos" removed=1 listeners=1
//! DEBUG Invalidated, refetching resource="pagos"
//! ```

pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
