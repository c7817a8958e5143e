use super::money::{Amount, Rate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque unique identifier of a payment within the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(String);

impl PaymentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PaymentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PaymentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One purchase transaction's accumulated state.
///
/// A payment is created with its identity and timestamps; every later event
/// only adds or overwrites fields. Fields that no event has set yet are `None`
/// and are left out of the serialized record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Fiat currency code; `None` means the payment is quoted in base units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Where the rate was sourced from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<Rate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,

    /// Amount asked for, in `currency` units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_amount: Option<Amount>,
    /// `requested_amount` converted to base units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_amount: Option<Amount>,
    /// Base-unit amount the tip is added to. Records written by the point of
    /// sale carry it directly; otherwise the last SetAmount promotes
    /// `computed_amount` into it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Amount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrated_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_ids: Option<Vec<String>>,
}

impl Payment {
    /// Creates a bare payment with only its identity and creation time set.
    pub fn new(id: impl Into<PaymentId>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at,
            updated_at: created_at,
            currency: None,
            exchange: None,
            rate: None,
            receipt: None,
            requested_amount: None,
            computed_amount: None,
            amount: None,
            tip: None,
            total: None,
            integrated_address: None,
            payment_id: None,
            received: None,
            confirmed: None,
            transaction_ids: None,
        }
    }

    /// Base-unit amount the tip is added to.
    ///
    /// Prefers the stored `amount`, then `computed_amount`, then zero.
    pub fn amount(&self) -> Amount {
        self.amount
            .or(self.computed_amount)
            .unwrap_or(Amount::ZERO)
    }

    /// Rate that requested amounts are divided by.
    ///
    /// The base unit always converts at one, whatever rate was last received.
    pub fn divisor(&self) -> Rate {
        match (&self.currency, self.rate) {
            (Some(_), Some(rate)) => rate,
            _ => Rate::ONE,
        }
    }
}
