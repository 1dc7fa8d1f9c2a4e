use serde::Serialize;

use crate::domain::{CustomerInvoice, Hire, SupplierPayment};
use crate::storage::IntegrityStats;

/// Filter for listing hires. `None` means no restriction.
#[derive(Debug, Clone, Default)]
pub struct HireFilter {
    /// Case-sensitive substring of the status label.
    pub status: Option<String>,
}

/// Filter for listing invoices. Set fields are combined with AND.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub payment_status: Option<String>,
    pub customer_name: Option<String>,
}

/// Filter for listing supplier payments. Set fields are combined with AND.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub supplier_name: Option<String>,
    pub status: Option<String>,
}

/// Empty filter values mean "no filter", as an operator leaving a prompt blank.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// A hire with its customer's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HireSummary {
    #[serde(flatten)]
    pub hire: Hire,
    pub customer_name: String,
}

/// An invoice with its customer's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceSummary {
    #[serde(flatten)]
    pub invoice: CustomerInvoice,
    pub customer_name: String,
}

/// A supplier payment with the supplier's company name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    #[serde(flatten)]
    pub payment: SupplierPayment,
    pub supplier_name: String,
}

/// Result of checking cross-record rules over the whole store.
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub hire_count: i64,
    pub invoice_count: i64,
    pub payment_count: i64,
    pub issues: Vec<String>,
}

impl IntegrityReport {
    pub fn from_stats(stats: &IntegrityStats) -> Self {
        let mut issues = Vec::new();

        if stats.rented_in_hires_without_supplier > 0 {
            issues.push(format!(
                "{} hire(s) on rented-in fleet have no supplier",
                stats.rented_in_hires_without_supplier
            ));
        }
        if stats.invoices_on_open_hires > 0 {
            issues.push(format!(
                "{} invoice(s) reference hires that are no longer completed",
                stats.invoices_on_open_hires
            ));
        }
        if stats.invoice_amount_mismatches > 0 {
            issues.push(format!(
                "{} invoice(s) differ from their hire's total or customer",
                stats.invoice_amount_mismatches
            ));
        }
        if stats.payment_supplier_mismatches > 0 {
            issues.push(format!(
                "{} supplier payment(s) do not match their hire's supplier",
                stats.payment_supplier_mismatches
            ));
        }
        if stats.malformed_invoice_numbers > 0 {
            issues.push(format!(
                "{} invoice number(s) do not follow INV-####",
                stats.malformed_invoice_numbers
            ));
        }

        Self {
            hire_count: stats.hire_count,
            invoice_count: stats.invoice_count,
            payment_count: stats.payment_count,
            issues,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}
