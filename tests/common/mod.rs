#![allow(dead_code)]

use pos_ledger::domain::event::{
    AmountRequest, ExchangeRate, IntegratedAddress, PaymentEvent, PaymentReceived, Receipt,
    Target, Tip,
};
use pos_ledger::domain::money::{Amount, Rate};
use pos_ledger::domain::payment::{Payment, PaymentId};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{Error, Write};
use std::path::Path;

pub const CREATED_AT: &str = "2017-06-17T17:32:04.735Z";
pub const TIPPED_AT: &str = "2017-06-17T17:41:14.353Z";
pub const ADDRESS: &str = "A3Brqw9sVmwLyWS8EWeUw1VqpqfwnDHTkG7Pb4NJ3RmZWeeMZhGMe2ZXz4bSk7BbtEYF5981nLxkDYQ6B46tX5DMVqg62UVmnbzRji2SB9";
pub const TX_ID: &str = "703b7eacf8f53016609671133f0584ba1cccb616ccdbafd49cc73fbba13a117b";

pub fn create(id: &str) -> PaymentEvent {
    PaymentEvent::CreatePayment(Payment::new(id, CREATED_AT.parse().unwrap()))
}

pub fn target(id: Option<&str>) -> Target {
    id.map_or(Target::All, |id| Target::Payment(PaymentId::new(id)))
}

/// The full lifecycle of one sale after its creation.
pub fn lifecycle(id: Option<&str>, amount: Decimal, tip: Decimal) -> Vec<PaymentEvent> {
    vec![
        PaymentEvent::ReceiveExchangeRate(ExchangeRate {
            target: target(id),
            currency: Some("EUR".to_string()),
            exchange: Some("https://www.kraken.com/".to_string()),
            rate: Rate::new(Decimal::new(4668377619, 8)).unwrap(),
        }),
        PaymentEvent::SetReceipt(Receipt {
            target: target(id),
            receipt: "070617/229-9".to_string(),
        }),
        PaymentEvent::SetAmount(AmountRequest {
            target: target(id),
            amount: Amount::new(amount).unwrap(),
        }),
        PaymentEvent::SetTip(Tip {
            target: target(id),
            tip: Amount::new(tip).unwrap(),
            updated_at: TIPPED_AT.parse().unwrap(),
        }),
        PaymentEvent::ReceiveIntegratedAddress(IntegratedAddress {
            target: target(id),
            integrated_address: ADDRESS.to_string(),
            payment_id: "6b1887e13bbd81db".to_string(),
        }),
        PaymentEvent::ReceivePayment(PaymentReceived {
            target: target(id),
            confirmed: false,
            received: Amount::new(Decimal::new(13, 1)).unwrap(),
            transaction_ids: vec![TX_ID.to_string()],
        }),
    ]
}

/// Writes events as a JSON-lines event log.
pub fn write_events(path: &Path, events: &[PaymentEvent]) -> Result<(), Error> {
    let mut file = File::create(path)?;
    for event in events {
        serde_json::to_writer(&mut file, event)?;
        writeln!(file)?;
    }
    file.flush()?;
    Ok(())
}

/// Event log of `sales` payments, each created and then driven through its lifecycle.
pub fn generate_event_log(path: &Path, sales: usize) -> Result<(), Error> {
    let mut events = Vec::new();
    for i in 1..=sales {
        let id = format!("sale-{i}");
        events.push(create(&id));
        events.extend(lifecycle(Some(&id), Decimal::new(i as i64, 2), Decimal::ZERO));
    }
    write_events(path, &events)
}
