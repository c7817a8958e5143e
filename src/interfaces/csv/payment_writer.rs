use crate::domain::ledger::Ledger;
use crate::domain::payment::Payment;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

/// Flat CSV form of a [`Payment`]; absent fields become empty cells.
///
/// Money columns keep their exact decimal text rather than the JSON number form.
#[derive(Serialize)]
struct PaymentRow<'a> {
    id: &'a str,
    created_at: String,
    updated_at: String,
    currency: Option<&'a str>,
    exchange: Option<&'a str>,
    rate: Option<Decimal>,
    receipt: Option<&'a str>,
    requested_amount: Option<Decimal>,
    computed_amount: Option<Decimal>,
    amount: Option<Decimal>,
    tip: Option<Decimal>,
    total: Option<Decimal>,
    integrated_address: Option<&'a str>,
    payment_id: Option<&'a str>,
    received: Option<Decimal>,
    confirmed: Option<bool>,
    transaction_ids: Option<String>,
}

impl<'a> From<&'a Payment> for PaymentRow<'a> {
    fn from(p: &'a Payment) -> Self {
        Self {
            id: p.id.as_str(),
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
            currency: p.currency.as_deref(),
            exchange: p.exchange.as_deref(),
            rate: p.rate.map(Decimal::from),
            receipt: p.receipt.as_deref(),
            requested_amount: p.requested_amount.map(Decimal::from),
            computed_amount: p.computed_amount.map(Decimal::from),
            amount: p.amount.map(Decimal::from),
            tip: p.tip.map(Decimal::from),
            total: p.total.map(Decimal::from),
            integrated_address: p.integrated_address.as_deref(),
            payment_id: p.payment_id.as_deref(),
            received: p.received.map(Decimal::from),
            confirmed: p.confirmed,
            transaction_ids: p.transaction_ids.as_ref().map(|ids| ids.join(";")),
        }
    }
}

/// Writes a ledger as CSV, one row per payment in ledger order.
pub struct PaymentWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PaymentWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_ledger(&mut self, ledger: &Ledger) -> Result<()> {
        for payment in ledger.iter() {
            self.writer.serialize(PaymentRow::from(payment))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
