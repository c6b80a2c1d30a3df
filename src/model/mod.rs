//! Backend entities and their create/update payloads.
//!
//! Field names are snake_case as the FastAPI backend emits them. Every entity implements
//! [`Resource`](crate::framework::Resource), which ties it to its REST collection and DTOs.

pub mod bank_transaction;
pub mod destajo;
pub mod metricas;
pub mod obra;
pub mod orden_compra;
pub mod pago;
pub mod proveedor;
pub mod requisicion;

pub use bank_transaction::*;
pub use destajo::*;
pub use metricas::*;
pub use obra::*;
pub use orden_compra::*;
pub use pago::*;
pub use proveedor::*;
pub use requisicion::*;
