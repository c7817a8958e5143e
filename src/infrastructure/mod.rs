//! Storage adapters for the [`LedgerRepository`](crate::domain::ports::LedgerRepository) port.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
