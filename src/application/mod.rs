//! Application layer wrapping the ledger reducer.
//!
//! This module defines the `LedgerEngine`, the single point through which
//! events reach the ledger. It serializes dispatch with a `tokio` mutex and
//! publishes each resulting ledger on a `watch` channel for read models.

pub mod engine;
