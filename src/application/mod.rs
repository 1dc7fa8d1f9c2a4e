// Application layer: the hire-to-settlement workflow on top of the repository.
// HireLedger owns hires, InvoiceSequencer owns customer invoices and
// SettlementTracker owns supplier payments; FleetService ties them together
// with the reference store.

pub mod error;
mod hires;
mod invoicing;
mod service;
mod settlement;
mod views;

pub use error::*;
pub use hires::HireLedger;
pub use invoicing::InvoiceSequencer;
pub use service::FleetService;
pub use settlement::SettlementTracker;
pub use views::*;
