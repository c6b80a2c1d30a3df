//! Concrete [`ResourceProvider`](crate::framework::ResourceProvider) implementations.

pub mod http;
pub mod memory;

pub use http::{ApiClient, ApiClientError, HttpBankTransactions, HttpMetrics, HttpProvider};
pub use memory::{fixtures, MemoryBankTransactions, MemoryMetrics, MemoryProvider, OrdenCompraDeps, Simulation};
