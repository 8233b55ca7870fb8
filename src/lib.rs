pub mod config;
pub mod error;
pub mod graph;
pub mod models;
pub mod netting;
pub mod service;
pub mod split;
pub mod storage;

pub use error::LedgerError;
pub use graph::in_memory::InMemoryGraph;
pub use service::LedgerService;
pub use storage::in_memory::InMemoryExpenses;

#[cfg(test)]
mod tests;
