//! Domain layer: payment records, the events that drive them and the ledger reducer.

pub mod event;
pub mod ledger;
pub mod money;
pub mod payment;
pub mod ports;
