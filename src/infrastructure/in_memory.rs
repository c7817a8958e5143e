use crate::domain::payment::{Payment, PaymentId};
use crate::domain::ports::LedgerRepository;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for ledger entries.
///
/// Uses `Arc<RwLock<Vec<Payment>>>` indexed by insertion position.
/// Ideal for testing or when the ledger does not need to outlive the process.
#[derive(Default, Clone)]
pub struct InMemoryLedgerRepository {
    payments: Arc<RwLock<Vec<Payment>>>,
}

impl InMemoryLedgerRepository {
    /// Creates a new, empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    async fn store_all(&self, entries: Vec<(usize, Payment)>) -> Result<()> {
        let mut payments = self.payments.write().await;
        let mut staged = payments.clone();
        for (position, payment) in entries {
            let staged_len = staged.len();
            match staged.get_mut(position) {
                Some(stored) if stored.id == payment.id => *stored = payment,
                Some(stored) => {
                    return Err(PaymentError::PositionConflict(
                        position,
                        stored.id.to_string(),
                    ));
                }
                None if position == staged_len => staged.push(payment),
                None => {
                    return Err(PaymentError::PositionConflict(
                        position,
                        payment.id.to_string(),
                    ));
                }
            }
        }
        *payments = staged;
        Ok(())
    }

    async fn get(&self, id: &PaymentId) -> Result<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.iter().find(|p| &p.id == id).cloned())
    }

    async fn all_payments(&self) -> Result<Vec<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.clone())
    }
}
