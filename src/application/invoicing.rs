use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{
    invoice_sequence, next_invoice_number, CustomerInvoice, Entity, HireId, HireStatus, InvoiceId, Lifecycle,
    PaymentStatus, ValidationError,
};
use crate::storage::{InvoiceInsert, Repository, StatusUpdate};

use super::hires::TRANSITION_ATTEMPTS;
use super::views::non_empty;
use super::{AppError, InvoiceFilter, InvoiceSummary};

/// Issues customer invoices for completed hires under a strictly increasing
/// `INV-####` sequence.
///
/// Allocation ("read last number, compute next, insert") runs under one async
/// mutex shared by every clone of the sequencer, so callers in this process
/// never race each other. Writers in other processes are caught by the unique
/// constraint on the invoice number and the allocation is retried.
#[derive(Debug, Clone)]
pub struct InvoiceSequencer {
    repo: Repository,
    allocation: Arc<Mutex<()>>,
    attempts: u32,
}

impl InvoiceSequencer {
    pub(crate) fn new(repo: Repository, attempts: u32) -> Self {
        Self {
            repo,
            allocation: Arc::new(Mutex::new(())),
            attempts: attempts.max(1),
        }
    }

    /// The number the next invoice would receive. Nothing is reserved.
    pub async fn next_invoice_number(&self) -> Result<String, AppError> {
        let last = self.repo.last_invoice_number().await?;
        Ok(next_invoice_number(last.as_deref()))
    }

    /// Issue an invoice for a completed hire.
    ///
    /// Amount and customer are copied from the hire at the moment of the
    /// insert, and the insert itself re-checks that the hire is still
    /// completed, so a stale list of eligible hires cannot produce an invoice.
    pub async fn create_invoice_from_hire(
        &self,
        hire_id: HireId,
        invoice_date: NaiveDate,
    ) -> Result<CustomerInvoice, AppError> {
        let _allocation = self.allocation.lock().await;

        let mut candidate = self.next_invoice_number().await?;
        for attempt in 1..=self.attempts {
            match self
                .repo
                .insert_invoice_for_hire(&candidate, hire_id, invoice_date)
                .await?
            {
                InvoiceInsert::Inserted(invoice) => {
                    info!(
                        invoice_id = invoice.id,
                        invoice_no = %invoice.invoice_no,
                        hire_id,
                        amount_cents = invoice.amount_cents,
                        "Invoice created"
                    );
                    return Ok(invoice);
                }
                InvoiceInsert::NumberTaken => {
                    warn!(
                        invoice_no = %candidate,
                        attempt,
                        "Invoice number already taken, allocating again"
                    );
                    // Never step back: the last row may be unparsable and
                    // keep pointing at a number below the one just refused.
                    let fresh = self.next_invoice_number().await?;
                    let walked = next_invoice_number(Some(&candidate));
                    candidate = if invoice_sequence(&fresh) > invoice_sequence(&walked) {
                        fresh
                    } else {
                        walked
                    };
                }
                InvoiceInsert::Ineligible => return Err(self.explain_ineligible(hire_id).await),
            }
        }

        Err(AppError::Conflict(format!(
            "could not allocate a unique invoice number after {} attempts",
            self.attempts
        )))
    }

    /// Work out why a hire could not be invoiced.
    async fn explain_ineligible(&self, hire_id: HireId) -> AppError {
        let hire = match self.repo.get_hire(hire_id).await {
            Ok(Some(hire)) => hire,
            Ok(None) => return AppError::not_found(Entity::Hire, hire_id),
            Err(err) => return err.into(),
        };
        if hire.status != HireStatus::Completed {
            return ValidationError::HireNotCompleted {
                hire_id,
                status: hire.status,
            }
            .into();
        }
        match self.repo.get_invoice_for_hire(hire_id).await {
            Ok(Some(existing)) => ValidationError::HireAlreadyInvoiced {
                hire_id,
                invoice_no: existing.invoice_no,
            }
            .into(),
            Ok(None) => AppError::Conflict(format!(
                "hire {} changed while it was being invoiced",
                hire_id
            )),
            Err(err) => err.into(),
        }
    }

    pub async fn get_invoice(&self, id: InvoiceId) -> Result<CustomerInvoice, AppError> {
        self.repo
            .get_invoice(id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Invoice, id))
    }

    /// Move an invoice forward: Unpaid -> Partially Paid -> Paid.
    /// Steps may be skipped, but a status never moves backwards.
    pub async fn update_payment_status(
        &self,
        id: InvoiceId,
        next: PaymentStatus,
    ) -> Result<CustomerInvoice, AppError> {
        for _ in 0..TRANSITION_ATTEMPTS {
            let mut invoice = self.get_invoice(id).await?;
            let current = invoice.payment_status;
            if !current.can_transition_to(next) {
                return Err(ValidationError::InvalidTransition {
                    entity: Entity::Invoice,
                    from: current.to_string(),
                    to: next.to_string(),
                }
                .into());
            }
            if current == next {
                return Ok(invoice);
            }

            match self
                .repo
                .compare_and_set_invoice_status(id, current, next)
                .await?
            {
                StatusUpdate::Applied => {
                    info!(invoice_id = id, from = %current, to = %next, "Invoice payment status changed");
                    invoice.payment_status = next;
                    return Ok(invoice);
                }
                StatusUpdate::Stale => {
                    debug!(invoice_id = id, "Invoice status changed concurrently, re-reading");
                }
                StatusUpdate::Missing => return Err(AppError::not_found(Entity::Invoice, id)),
            }
        }

        Err(AppError::Conflict(format!(
            "invoice {} kept changing status concurrently",
            id
        )))
    }

    /// Administrative override: set any payment status, including backwards.
    pub async fn override_payment_status(
        &self,
        id: InvoiceId,
        status: PaymentStatus,
    ) -> Result<CustomerInvoice, AppError> {
        if !self.repo.force_invoice_status(id, status).await? {
            return Err(AppError::not_found(Entity::Invoice, id));
        }
        warn!(invoice_id = id, to = %status, "Invoice payment status overridden");
        self.get_invoice(id).await
    }

    pub async fn list_invoices(
        &self,
        filter: &InvoiceFilter,
    ) -> Result<Vec<InvoiceSummary>, AppError> {
        let rows = self
            .repo
            .list_invoices(
                non_empty(&filter.payment_status),
                non_empty(&filter.customer_name),
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|(invoice, customer_name)| InvoiceSummary {
                invoice,
                customer_name,
            })
            .collect())
    }
}
