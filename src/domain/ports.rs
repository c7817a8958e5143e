use super::payment::{Payment, PaymentId};
use crate::error::Result;
use async_trait::async_trait;

/// Persistence for ledger entries.
///
/// Entries are addressed by their insertion position so that reading them back
/// restores the ledger order.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Writes a batch of `(position, payment)` entries, all or nothing.
    ///
    /// A position may only be rewritten with the payment it already holds, and
    /// new positions must extend the stored sequence without gaps. A batch that
    /// breaks either rule fails with [`PositionConflict`](crate::error::PaymentError::PositionConflict)
    /// and leaves the store as it was.
    async fn store_all(&self, entries: Vec<(usize, Payment)>) -> Result<()>;
    async fn get(&self, id: &PaymentId) -> Result<Option<Payment>>;
    async fn all_payments(&self) -> Result<Vec<Payment>>;
}

pub type LedgerRepositoryBox = Box<dyn LedgerRepository>;
