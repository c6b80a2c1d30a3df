//! # obra-data
//!
//! > **The data-fetching and view-state layer of a construction ERP.**
//!
//! Views for obras, proveedores, requisiciones, órdenes de compra, pagos and destajos all sit on
//! the same small set of pieces: a provider per entity, reactive list/item queries over it, and
//! mutations. This crate implements those pieces once, generically, and wires them to either the
//! REST backend or an in-memory store.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### One generic path per concern
//! Every entity implements [`Resource`](framework::Resource). After that, `ListQuery<Obra>`,
//! `HttpProvider<Pago>` and `ResourceStore<Destajo>` come for free: the fetch/loading/error
//! logic is written once.
//!
//! ### Explicit provider injection
//! [`ErpSystem::start`](lifecycle::ErpSystem::start) reads the configuration once and builds a
//! [`DataProvider`](framework::DataProvider). Queries and mutations receive their provider as an
//! argument; there is no global.
//!
//! ### Four view states
//! A view never inspects loading flags and errors itself. It asks
//! [`resolve`](hooks::resolve) (or `state.view_state()`) and renders one of
//! `loading | error | empty | data`.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! - **Role**: provider interface, list parameters and pages, errors, the in-memory store task.
//! - **Key items**: [`ResourceProvider`](framework::ResourceProvider),
//!   [`ResourceStore`](framework::ResourceStore), [`MockProvider`](framework::mock::MockProvider).
//!
//! ### 2. The Adapters ([`adapters`])
//! - **Role**: the two provider implementations, HTTP and in-memory (with dev modes).
//!
//! ### 3. The Hooks ([`hooks`])
//! - **Role**: what views bind to.
//! - **Key items**: [`ListQuery`](hooks::ListQuery), [`ItemQuery`](hooks::ItemQuery),
//!   [`Mutation`](hooks::Mutation), [`QueryCache`](hooks::QueryCache).
//!
//! ### 4. The Orchestrator ([`lifecycle`])
//! - **Role**: provider selection, store wiring, shutdown, logging setup.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # In-memory fixtures, info logs
//! RUST_LOG=info cargo run
//!
//! # Against a running backend
//! ERP_DATA_MODE=api ERP_API_BASE_URL=http://localhost:8000/api/v1 cargo run
//!
//! # Exercise the error view
//! ERP_MOCK_MODE=error cargo run
//! ```

pub mod adapters;
pub mod config;
pub mod framework;
pub mod hooks;
pub mod lifecycle;
pub mod model;
