use chrono::NaiveDate;
use thiserror::Error;

use super::{Cents, HireId, HireStatus};

/// The record kinds the engine reads or owns, used to label lookups and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Fleet,
    Driver,
    Customer,
    Supplier,
    Hire,
    Invoice,
    Payment,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Fleet => "fleet",
            Entity::Driver => "driver",
            Entity::Customer => "customer",
            Entity::Supplier => "supplier",
            Entity::Hire => "hire",
            Entity::Invoice => "invoice",
            Entity::Payment => "supplier payment",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Business rules a caller can break. Each one needs corrected input, so none
/// of them are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Fleet {fleet_id} is rented in: a known supplier is required")]
    SupplierRequired { fleet_id: String },

    #[error("Invalid hire type '{0}'. Valid types: Daily, Weekly, Monthly, Trip")]
    InvalidHireType(String),

    #[error("Rate must be positive, got {0} cents")]
    InvalidRate(Cents),

    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("Total amount overflows for rate {rate} cents x {quantity}")]
    AmountOverflow { rate: Cents, quantity: i64 },

    #[error("Amount must be positive, got {0} cents")]
    InvalidAmount(Cents),

    #[error("Hire {hire_id} is {status}, only completed hires can be invoiced")]
    HireNotCompleted { hire_id: HireId, status: HireStatus },

    #[error("Hire {hire_id} is already invoiced as {invoice_no}")]
    HireAlreadyInvoiced { hire_id: HireId, invoice_no: String },

    #[error("Hire {0} has no supplier to pay")]
    NoSupplierOnHire(HireId),

    #[error("Cannot move {entity} from '{from}' to '{to}'")]
    InvalidTransition {
        entity: Entity,
        from: String,
        to: String,
    },

    #[error("Fleet {fleet_id} ownership is locked: referenced by {hire_count} hire(s)")]
    OwnershipLocked { fleet_id: String, hire_count: i64 },
}
