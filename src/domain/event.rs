use super::ledger::Ledger;
use super::money::{Amount, Rate};
use super::payment::{Payment, PaymentId};
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Which payments an event's overlay is applied to.
///
/// On the wire this is the optional `id` field of the payload: an absent id
/// broadcasts the overlay to every payment in the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Target {
    #[default]
    All,
    Payment(PaymentId),
}

impl Target {
    pub fn matches(&self, id: &PaymentId) -> bool {
        match self {
            Target::All => true,
            Target::Payment(target) => target == id,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Target::All)
    }
}

impl From<Option<PaymentId>> for Target {
    fn from(id: Option<PaymentId>) -> Self {
        id.map_or(Target::All, Target::Payment)
    }
}

impl From<Target> for Option<PaymentId> {
    fn from(target: Target) -> Self {
        match target {
            Target::All => None,
            Target::Payment(id) => Some(id),
        }
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Target::All => serializer.serialize_none(),
            Target::Payment(id) => serializer.serialize_some(id),
        }
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Option::<PaymentId>::deserialize(deserializer).map(Target::from)
    }
}

/// A price tick from an exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    #[serde(default, rename = "id", skip_serializing_if = "Target::is_all")]
    pub target: Target,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    pub rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(default, rename = "id", skip_serializing_if = "Target::is_all")]
    pub target: Target,
    pub receipt: String,
}

/// Amount entered by the cashier, in the payment's currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountRequest {
    #[serde(default, rename = "id", skip_serializing_if = "Target::is_all")]
    pub target: Target,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tip {
    #[serde(default, rename = "id", skip_serializing_if = "Target::is_all")]
    pub target: Target,
    pub tip: Amount,
    pub updated_at: DateTime<Utc>,
}

/// Address the customer pays to, as issued by the wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegratedAddress {
    #[serde(default, rename = "id", skip_serializing_if = "Target::is_all")]
    pub target: Target,
    pub integrated_address: String,
    pub payment_id: String,
}

/// Funds seen on chain for a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceived {
    #[serde(default, rename = "id", skip_serializing_if = "Target::is_all")]
    pub target: Target,
    pub confirmed: bool,
    pub received: Amount,
    pub transaction_ids: Vec<String>,
}

/// A lifecycle transition of a payment.
///
/// Serialized as `{"type": KIND, "payload": {...}}`. Kinds this crate does not
/// know deserialize into [`PaymentEvent::Unknown`] instead of failing, so an
/// event log written by a newer producer can still be replayed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawEvent")]
pub enum PaymentEvent {
    CreatePayment(Payment),
    ReceiveExchangeRate(ExchangeRate),
    SetReceipt(Receipt),
    SetAmount(AmountRequest),
    SetTip(Tip),
    ReceiveIntegratedAddress(IntegratedAddress),
    ReceivePayment(PaymentReceived),
    Unknown {
        kind: String,
        payload: serde_json::Value,
    },
}

impl PaymentEvent {
    pub const CREATE_PAYMENT: &'static str = "CREATE_PAYMENT";
    pub const RECEIVE_EXCHANGE_RATE: &'static str = "RECEIVE_EXCHANGE_RATE";
    pub const SET_RECEIPT: &'static str = "SET_RECEIPT";
    pub const SET_AMOUNT: &'static str = "SET_AMOUNT";
    pub const SET_TIP: &'static str = "SET_TIP";
    pub const RECEIVE_INTEGRATED_ADDRESS: &'static str = "RECEIVE_INTEGRATED_ADDRESS";
    pub const RECEIVE_PAYMENT: &'static str = "RECEIVE_PAYMENT";

    /// The wire discriminator of this event.
    pub fn kind(&self) -> &str {
        match self {
            PaymentEvent::CreatePayment(_) => Self::CREATE_PAYMENT,
            PaymentEvent::ReceiveExchangeRate(_) => Self::RECEIVE_EXCHANGE_RATE,
            PaymentEvent::SetReceipt(_) => Self::SET_RECEIPT,
            PaymentEvent::SetAmount(_) => Self::SET_AMOUNT,
            PaymentEvent::SetTip(_) => Self::SET_TIP,
            PaymentEvent::ReceiveIntegratedAddress(_) => Self::RECEIVE_INTEGRATED_ADDRESS,
            PaymentEvent::ReceivePayment(_) => Self::RECEIVE_PAYMENT,
            PaymentEvent::Unknown { kind, .. } => kind,
        }
    }

    /// The payments an overlay event is aimed at. `None` for creation and
    /// unknown events.
    pub fn target(&self) -> Option<&Target> {
        match self {
            PaymentEvent::ReceiveExchangeRate(e) => Some(&e.target),
            PaymentEvent::SetReceipt(e) => Some(&e.target),
            PaymentEvent::SetAmount(e) => Some(&e.target),
            PaymentEvent::SetTip(e) => Some(&e.target),
            PaymentEvent::ReceiveIntegratedAddress(e) => Some(&e.target),
            PaymentEvent::ReceivePayment(e) => Some(&e.target),
            PaymentEvent::CreatePayment(_) | PaymentEvent::Unknown { .. } => None,
        }
    }

    /// Checks the event against the ledger it is about to be applied to.
    ///
    /// The reducer accepts anything; this is the stricter gate an event source
    /// can put in front of it.
    pub fn validate(&self, ledger: &Ledger) -> Result<()> {
        if let Some(Target::Payment(id)) = self.target()
            && ledger.get(id).is_none()
        {
            return Err(PaymentError::UnknownPayment(id.to_string()));
        }

        match self {
            PaymentEvent::CreatePayment(payment) => {
                if payment.id.as_str().is_empty() {
                    return Err(PaymentError::ValidationError(
                        "Payment id must not be empty".to_string(),
                    ));
                }
                if ledger.get(&payment.id).is_some() {
                    return Err(PaymentError::DuplicatePayment(payment.id.to_string()));
                }
                if payment.updated_at < payment.created_at {
                    return Err(PaymentError::ValidationError(
                        "updatedAt must not precede createdAt".to_string(),
                    ));
                }
                if payment.currency.is_none() && payment.rate.is_some_and(|r| r != Rate::ONE) {
                    return Err(PaymentError::ValidationError(
                        "Base unit payments must have a rate of 1".to_string(),
                    ));
                }
                Ok(())
            }
            PaymentEvent::ReceiveExchangeRate(e) => {
                if e.currency.is_none() && e.rate != Rate::ONE {
                    return Err(PaymentError::ValidationError(
                        "Base unit payments must have a rate of 1".to_string(),
                    ));
                }
                Ok(())
            }
            PaymentEvent::SetTip(e) => {
                let stale = ledger
                    .iter()
                    .filter(|p| e.target.matches(&p.id))
                    .any(|p| e.updated_at < p.created_at);
                if stale {
                    return Err(PaymentError::ValidationError(
                        "updatedAt must not precede createdAt".to_string(),
                    ));
                }
                Ok(())
            }
            PaymentEvent::Unknown { kind, .. } => {
                Err(PaymentError::UnsupportedEvent(kind.clone()))
            }
            PaymentEvent::SetReceipt(_)
            | PaymentEvent::SetAmount(_)
            | PaymentEvent::ReceiveIntegratedAddress(_)
            | PaymentEvent::ReceivePayment(_) => Ok(()),
        }
    }
}

/// Envelope used to route a payload to its typed variant.
#[derive(Deserialize)]
struct RawEvent {
    r#type: String,
    #[serde(default)]
    payload: serde_json::Value,
}

impl TryFrom<RawEvent> for PaymentEvent {
    type Error = PaymentError;

    fn try_from(raw: RawEvent) -> Result<Self> {
        let payload = raw.payload;
        let event = match raw.r#type.as_str() {
            Self::CREATE_PAYMENT => PaymentEvent::CreatePayment(serde_json::from_value(payload)?),
            Self::RECEIVE_EXCHANGE_RATE => {
                PaymentEvent::ReceiveExchangeRate(serde_json::from_value(payload)?)
            }
            Self::SET_RECEIPT => PaymentEvent::SetReceipt(serde_json::from_value(payload)?),
            Self::SET_AMOUNT => PaymentEvent::SetAmount(serde_json::from_value(payload)?),
            Self::SET_TIP => PaymentEvent::SetTip(serde_json::from_value(payload)?),
            Self::RECEIVE_INTEGRATED_ADDRESS => {
                PaymentEvent::ReceiveIntegratedAddress(serde_json::from_value(payload)?)
            }
            Self::RECEIVE_PAYMENT => PaymentEvent::ReceivePayment(serde_json::from_value(payload)?),
            _ => PaymentEvent::Unknown {
                kind: raw.r#type.clone(),
                payload,
            },
        };
        Ok(event)
    }
}

impl Serialize for PaymentEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PaymentEvent", 2)?;
        state.serialize_field("type", self.kind())?;
        match self {
            PaymentEvent::CreatePayment(p) => state.serialize_field("payload", p)?,
            PaymentEvent::ReceiveExchangeRate(p) => state.serialize_field("payload", p)?,
            PaymentEvent::SetReceipt(p) => state.serialize_field("payload", p)?,
            PaymentEvent::SetAmount(p) => state.serialize_field("payload", p)?,
            PaymentEvent::SetTip(p) => state.serialize_field("payload", p)?,
            PaymentEvent::ReceiveIntegratedAddress(p) => state.serialize_field("payload", p)?,
            PaymentEvent::ReceivePayment(p) => state.serialize_field("payload", p)?,
            PaymentEvent::Unknown { payload, .. } => state.serialize_field("payload", payload)?,
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const ID: &str = "a2f8d724-5c7a-43e9-bbac-b0295b059e82";

    fn created_at() -> DateTime<Utc> {
        "2017-06-17T17:32:04.735Z".parse().unwrap()
    }

    fn ledger_with_payment() -> Ledger {
        Ledger::new().apply(&PaymentEvent::CreatePayment(Payment::new(ID, created_at())))
    }

    #[test]
    fn test_deserialize_create_payment() {
        let json = format!(
            r#"{{"type": "CREATE_PAYMENT", "payload": {{"id": "{ID}", "createdAt": "2017-06-17T17:32:04.735Z", "updatedAt": "2017-06-17T17:32:04.735Z"}}}}"#
        );
        let event: PaymentEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(
            event,
            PaymentEvent::CreatePayment(Payment::new(ID, created_at()))
        );
    }

    #[test]
    fn test_deserialize_exchange_rate_without_id_targets_all() {
        let json = r#"{"type": "RECEIVE_EXCHANGE_RATE", "payload": {"currency": "EUR", "exchange": "https://www.kraken.com/", "rate": 46.68377619}}"#;
        let event: PaymentEvent = serde_json::from_str(json).unwrap();
        let PaymentEvent::ReceiveExchangeRate(rate) = event else {
            panic!("expected an exchange rate event");
        };
        assert_eq!(rate.target, Target::All);
        assert_eq!(rate.currency.as_deref(), Some("EUR"));
        assert_eq!(rate.rate.value(), dec!(46.68377619));
    }

    #[test]
    fn test_deserialize_targeted_tip() {
        let json = format!(
            r#"{{"type": "SET_TIP", "payload": {{"id": "{ID}", "tip": 0.07, "updatedAt": "2017-06-17T17:41:14.353Z"}}}}"#
        );
        let event: PaymentEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event.target(), Some(&Target::Payment(PaymentId::new(ID))));
        assert_eq!(event.kind(), PaymentEvent::SET_TIP);
    }

    #[test]
    fn test_deserialize_unknown_kind() {
        let json = r#"{"type": "DELETE_PAYMENT", "payload": {"id": "x"}}"#;
        let event: PaymentEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, PaymentEvent::Unknown { ref kind, .. } if kind == "DELETE_PAYMENT"));
        assert_eq!(event.target(), None);
    }

    #[test]
    fn test_deserialize_rejects_missing_fields() {
        let json = r#"{"type": "SET_AMOUNT", "payload": {}}"#;
        assert!(serde_json::from_str::<PaymentEvent>(json).is_err());

        let json = r#"{"type": "RECEIVE_PAYMENT", "payload": {"confirmed": false}}"#;
        assert!(serde_json::from_str::<PaymentEvent>(json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_negative_amount() {
        let json = r#"{"type": "SET_AMOUNT", "payload": {"amount": -3}}"#;
        assert!(serde_json::from_str::<PaymentEvent>(json).is_err());
    }

    #[test]
    fn test_serialize_uses_wire_envelope() {
        let event = PaymentEvent::SetReceipt(Receipt {
            target: Target::All,
            receipt: "070617/229-9".to_string(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "SET_RECEIPT", "payload": {"receipt": "070617/229-9"}})
        );

        let parsed: PaymentEvent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_validate_rejects_duplicate_creation() {
        let ledger = ledger_with_payment();
        let event = PaymentEvent::CreatePayment(Payment::new(ID, created_at()));
        assert!(matches!(
            event.validate(&ledger),
            Err(PaymentError::DuplicatePayment(_))
        ));
        assert!(event.validate(&Ledger::new()).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_target() {
        let ledger = ledger_with_payment();
        let event = PaymentEvent::SetReceipt(Receipt {
            target: Target::Payment(PaymentId::new("missing")),
            receipt: "070617/229-9".to_string(),
        });
        assert!(matches!(
            event.validate(&ledger),
            Err(PaymentError::UnknownPayment(_))
        ));
    }

    #[test]
    fn test_validate_rejects_base_unit_rate() {
        let event = PaymentEvent::ReceiveExchangeRate(ExchangeRate {
            target: Target::All,
            currency: None,
            exchange: None,
            rate: Rate::new(dec!(2)).unwrap(),
        });
        assert!(matches!(
            event.validate(&Ledger::new()),
            Err(PaymentError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_tip_before_creation() {
        let ledger = ledger_with_payment();
        let event = PaymentEvent::SetTip(Tip {
            target: Target::All,
            tip: Amount::new(dec!(0.07)).unwrap(),
            updated_at: "2017-06-17T17:00:00Z".parse().unwrap(),
        });
        assert!(matches!(
            event.validate(&ledger),
            Err(PaymentError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_kind() {
        let event = PaymentEvent::Unknown {
            kind: "DELETE_PAYMENT".to_string(),
            payload: serde_json::Value::Null,
        };
        assert!(matches!(
            event.validate(&Ledger::new()),
            Err(PaymentError::UnsupportedEvent(_))
        ));
    }
}
