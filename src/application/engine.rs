use crate::domain::event::PaymentEvent;
use crate::domain::ledger::{Ledger, reduce};
use crate::domain::ports::LedgerRepositoryBox;
use crate::error::Result;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

/// What a dispatched event did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Applied,
    Unchanged,
}

/// The serialization point in front of the ledger reducer.
///
/// `LedgerEngine` applies events one at a time, publishes every new ledger to
/// its subscribers and writes the entries that changed to the repository.
pub struct LedgerEngine {
    repository: LedgerRepositoryBox,
    state: watch::Sender<Ledger>,
    dispatch_lock: Mutex<()>,
    strict: bool,
}

impl LedgerEngine {
    /// Opens a `LedgerEngine` over `repository`, starting from the ledger it holds.
    ///
    /// # Arguments
    ///
    /// * `repository` - Where ledger entries are persisted.
    pub async fn open(repository: LedgerRepositoryBox) -> Result<Self> {
        let ledger = Ledger::from_payments(repository.all_payments().await?);
        info!(payments = ledger.len(), "opened ledger");
        let (state, _) = watch::channel(ledger);
        Ok(Self {
            repository,
            state,
            dispatch_lock: Mutex::new(()),
            strict: false,
        })
    }

    /// Rejects events that fail [`PaymentEvent::validate`] instead of applying them.
    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Applies an event to the current ledger.
    ///
    /// Events are applied strictly in the order their dispatch acquires the
    /// engine. The changed entries are written as one batch before the new
    /// ledger is published; if the write fails the published ledger stays as
    /// it was. Subscribers are only notified when the ledger changed.
    pub async fn dispatch(&self, event: PaymentEvent) -> Result<DispatchOutcome> {
        let _guard = self.dispatch_lock.lock().await;
        let prior = self.ledger();

        if self.strict {
            event.validate(&prior)?;
        }
        if let PaymentEvent::Unknown { kind, .. } = &event {
            warn!(kind = %kind, "ignoring unknown event kind");
        }

        let next = reduce(&prior, &event);
        if Ledger::ptr_eq(&prior, &next) {
            debug!(kind = event.kind(), "event left ledger unchanged");
            return Ok(DispatchOutcome::Unchanged);
        }

        let changes = next
            .changed_since(&prior)
            .into_iter()
            .map(|(position, payment)| (position, payment.clone()))
            .collect();
        self.repository.store_all(changes).await?;
        debug!(kind = event.kind(), payments = next.len(), "event applied");
        self.state.send_replace(next);
        Ok(DispatchOutcome::Applied)
    }

    /// Snapshot of the current ledger.
    pub fn ledger(&self) -> Ledger {
        self.state.borrow().clone()
    }

    /// Receiver for read-model consumers; yields every ledger the engine publishes.
    pub fn subscribe(&self) -> watch::Receiver<Ledger> {
        self.state.subscribe()
    }

    /// Consumes the engine and returns the final ledger.
    pub async fn into_results(self) -> Result<Ledger> {
        Ok(self.ledger())
    }
}
