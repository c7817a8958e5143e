//! The payment ledger and its reducer.
//!
//! [`reduce`] is a pure function of the prior ledger and one event. It never
//! fails and never touches a payment that has already been published: an
//! entry that changes is rebuilt as a new `Arc<Payment>`, untouched entries
//! are shared with the prior ledger, and an event that changes nothing hands
//! back the very same ledger.

use super::event::{PaymentEvent, Target};
use super::payment::{Payment, PaymentId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::sync::Arc;

/// Insertion-ordered collection of payments keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: Arc<Vec<Arc<Payment>>>,
    index: Arc<HashMap<PaymentId, usize>>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from stored payments. Later duplicates of an id are dropped.
    pub fn from_payments<I: IntoIterator<Item = Payment>>(payments: I) -> Self {
        payments
            .into_iter()
            .map(PaymentEvent::CreatePayment)
            .fold(Self::new(), |ledger, event| reduce(&ledger, &event))
    }

    /// Replays an event sequence from the empty ledger.
    pub fn replay<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a PaymentEvent>,
    {
        events
            .into_iter()
            .fold(Self::new(), |ledger, event| reduce(&ledger, event))
    }

    pub fn apply(&self, event: &PaymentEvent) -> Self {
        reduce(self, event)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &PaymentId) -> Option<&Payment> {
        self.index.get(id).map(|&position| self.entries[position].as_ref())
    }

    /// Iterates payments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Payment> {
        self.entries.iter().map(Arc::as_ref)
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.iter().cloned().collect()
    }

    /// Whether both ledgers share the same entry storage.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.entries, &b.entries)
    }

    /// Positions whose entry was replaced or appended since `prior`.
    ///
    /// Only meaningful when `self` descends from `prior` through [`reduce`].
    pub fn changed_since<'a>(&'a self, prior: &Self) -> Vec<(usize, &'a Payment)> {
        if Self::ptr_eq(self, prior) {
            return Vec::new();
        }
        self.entries
            .iter()
            .enumerate()
            .filter(|(position, entry)| {
                prior
                    .entries
                    .get(*position)
                    .is_none_or(|old| !Arc::ptr_eq(old, *entry))
            })
            .map(|(position, entry)| (position, entry.as_ref()))
            .collect()
    }

    fn append(&self, payment: &Payment) -> Self {
        if self.index.contains_key(&payment.id) {
            return self.clone();
        }
        let mut entries = Vec::with_capacity(self.entries.len() + 1);
        entries.extend(self.entries.iter().cloned());
        entries.push(Arc::new(payment.clone()));

        let mut index = (*self.index).clone();
        index.insert(payment.id.clone(), entries.len() - 1);

        Self {
            entries: Arc::new(entries),
            index: Arc::new(index),
        }
    }

    /// Applies `update` to a copy of every targeted payment.
    ///
    /// Copies that come out equal to the original are discarded so the
    /// original entry stays shared.
    fn overlay<F>(&self, target: &Target, update: F) -> Self
    where
        F: Fn(&mut Payment),
    {
        let mut changed = false;
        let entries: Vec<Arc<Payment>> = self
            .entries
            .iter()
            .map(|entry| {
                if !target.matches(&entry.id) {
                    return Arc::clone(entry);
                }
                let mut next = (**entry).clone();
                update(&mut next);
                // Decimal equality ignores scale, so a rewrite that only
                // changes trailing zeros (0.07 vs 0.070) keeps the entry.
                if next == **entry {
                    Arc::clone(entry)
                } else {
                    changed = true;
                    Arc::new(next)
                }
            })
            .collect();

        if !changed {
            return self.clone();
        }
        Self {
            entries: Arc::new(entries),
            index: Arc::clone(&self.index),
        }
    }
}

impl PartialEq for Ledger {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || self.iter().eq(other.iter())
    }
}

impl Serialize for Ledger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for Ledger {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<Payment>::deserialize(deserializer).map(Self::from_payments)
    }
}

/// Computes the ledger that results from applying `event` to `ledger`.
pub fn reduce(ledger: &Ledger, event: &PaymentEvent) -> Ledger {
    match event {
        PaymentEvent::CreatePayment(payment) => ledger.append(payment),
        PaymentEvent::ReceiveExchangeRate(e) => ledger.overlay(&e.target, |p| {
            p.currency = e.currency.clone();
            p.exchange = e.exchange.clone();
            p.rate = Some(e.rate);
        }),
        PaymentEvent::SetReceipt(e) => ledger.overlay(&e.target, |p| {
            p.receipt = Some(e.receipt.clone());
        }),
        PaymentEvent::SetAmount(e) => ledger.overlay(&e.target, |p| {
            p.requested_amount = Some(e.amount);
            p.computed_amount = e.amount.convert(p.divisor());
            p.amount = p.computed_amount;
        }),
        PaymentEvent::SetTip(e) => ledger.overlay(&e.target, |p| {
            p.tip = Some(e.tip);
            p.total = p.amount().checked_add(e.tip);
            p.updated_at = e.updated_at;
        }),
        PaymentEvent::ReceiveIntegratedAddress(e) => ledger.overlay(&e.target, |p| {
            p.integrated_address = Some(e.integrated_address.clone());
            p.payment_id = Some(e.payment_id.clone());
        }),
        PaymentEvent::ReceivePayment(e) => ledger.overlay(&e.target, |p| {
            p.confirmed = Some(e.confirmed);
            p.received = Some(e.received);
            p.transaction_ids = Some(e.transaction_ids.clone());
        }),
        PaymentEvent::Unknown { .. } => ledger.clone(),
    }
}
