use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Cents, CustomerId, HireId, Lifecycle};

pub type InvoiceId = i64;

pub const INVOICE_PREFIX: &str = "INV";

/// Format a sequence value as an invoice number, padded to four digits.
/// Larger values print in full: 12345 -> "INV-12345".
pub fn format_invoice_number(sequence: u64) -> String {
    format!("{}-{:04}", INVOICE_PREFIX, sequence)
}

/// Sequence value of an invoice number, if its suffix after the last `-`
/// is an integer.
pub fn invoice_sequence(number: &str) -> Option<u64> {
    number
        .rsplit('-')
        .next()
        .and_then(|suffix| suffix.trim().parse::<u64>().ok())
}

/// Derive the number that follows `last`, the most recently issued invoice.
///
/// The suffix after the last `-` is incremented. When there is no previous
/// invoice, or its suffix is not an integer, the sequence starts at 1.
pub fn next_invoice_number(last: Option<&str>) -> String {
    let next = last
        .and_then(invoice_sequence)
        .and_then(|value| value.checked_add(1))
        .unwrap_or(1);
    format_invoice_number(next)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Unpaid,
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::PartiallyPaid => "Partially Paid",
            PaymentStatus::Paid => "Paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "partially paid" | "partial" => Some(PaymentStatus::PartiallyPaid),
            "paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

impl Lifecycle for PaymentStatus {
    fn successors(self) -> &'static [Self] {
        match self {
            PaymentStatus::Unpaid => &[PaymentStatus::PartiallyPaid, PaymentStatus::Paid],
            PaymentStatus::PartiallyPaid => &[PaymentStatus::Paid],
            PaymentStatus::Paid => &[],
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A customer invoice issued for one completed hire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInvoice {
    pub id: InvoiceId,
    pub invoice_no: String,
    pub hire_id: HireId,
    pub customer_id: CustomerId,
    pub invoice_date: NaiveDate,
    /// Copied from the hire total when the invoice is issued
    pub amount_cents: Cents,
    pub payment_status: PaymentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_invoice_number() {
        assert_eq!(next_invoice_number(None), "INV-0001");
    }

    #[test]
    fn test_next_invoice_number_increments_suffix() {
        assert_eq!(next_invoice_number(Some("INV-0001")), "INV-0002");
        assert_eq!(next_invoice_number(Some("INV-0099")), "INV-0100");
        assert_eq!(next_invoice_number(Some("INV-9999")), "INV-10000");
        assert_eq!(next_invoice_number(Some("INV-10000")), "INV-10001");
    }

    #[test]
    fn test_suffix_after_last_dash_is_used() {
        assert_eq!(next_invoice_number(Some("INV-2024-0041")), "INV-0042");
    }

    #[test]
    fn test_unparsable_suffix_restarts_sequence() {
        assert_eq!(next_invoice_number(Some("INV-ABCD")), "INV-0001");
        assert_eq!(next_invoice_number(Some("legacy")), "INV-0001");
        assert_eq!(next_invoice_number(Some("INV-")), "INV-0001");
    }

    #[test]
    fn test_invoice_sequence() {
        assert_eq!(invoice_sequence("INV-0042"), Some(42));
        assert_eq!(invoice_sequence("INV-10000"), Some(10000));
        assert_eq!(invoice_sequence("LEGACY-A"), None);
        assert!(invoice_sequence("INV-0003") > invoice_sequence("LEGACY-A"));
    }

    #[test]
    fn test_payment_status_labels() {
        assert_eq!(PaymentStatus::PartiallyPaid.as_str(), "Partially Paid");
        assert_eq!(
            PaymentStatus::from_str("partially-paid"),
            Some(PaymentStatus::PartiallyPaid)
        );
        assert_eq!(PaymentStatus::from_str("PAID"), Some(PaymentStatus::Paid));
        assert_eq!(PaymentStatus::from_str("refunded"), None);
    }

    #[test]
    fn test_payment_status_never_regresses() {
        assert!(PaymentStatus::Unpaid.can_transition_to(PaymentStatus::PartiallyPaid));
        assert!(PaymentStatus::Unpaid.can_transition_to(PaymentStatus::Paid));
        assert!(PaymentStatus::PartiallyPaid.can_transition_to(PaymentStatus::Paid));
        assert!(!PaymentStatus::Paid.can_transition_to(PaymentStatus::Unpaid));
        assert!(!PaymentStatus::PartiallyPaid.can_transition_to(PaymentStatus::Unpaid));
    }
}
