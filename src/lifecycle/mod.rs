//! Startup, provider selection and shutdown.

pub mod erp_system;
pub mod tracing;

pub use erp_system::{ErpSystem, SystemError};
