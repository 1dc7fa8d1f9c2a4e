use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Cents, HireId, Lifecycle, SupplierId};

pub type PaymentId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlementStatus {
    Pending,
    Paid,
}

impl SettlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Pending => "Pending",
            SettlementStatus::Paid => "Paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(SettlementStatus::Pending),
            "paid" => Some(SettlementStatus::Paid),
            _ => None,
        }
    }
}

impl Lifecycle for SettlementStatus {
    fn successors(self) -> &'static [Self] {
        match self {
            SettlementStatus::Pending => &[SettlementStatus::Paid],
            SettlementStatus::Paid => &[],
        }
    }
}

impl std::fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment owed to the supplier of a rented-in asset.
/// The supplier is always the one recorded on the hire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierPayment {
    pub id: PaymentId,
    pub supplier_id: SupplierId,
    pub hire_id: HireId,
    pub payment_date: NaiveDate,
    pub amount_cents: Cents,
    pub status: SettlementStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settlement_status_roundtrip() {
        for status in [SettlementStatus::Pending, SettlementStatus::Paid] {
            assert_eq!(SettlementStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_paid_is_terminal() {
        assert!(SettlementStatus::Pending.can_transition_to(SettlementStatus::Paid));
        assert!(!SettlementStatus::Paid.can_transition_to(SettlementStatus::Pending));
        assert!(SettlementStatus::Paid.is_terminal());
    }
}
