use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::{
    Cents, Entity, HireId, Lifecycle, PaymentId, SettlementStatus, SupplierPayment,
    ValidationError,
};
use crate::storage::{Repository, StatusUpdate};

use super::hires::TRANSITION_ATTEMPTS;
use super::views::non_empty;
use super::{AppError, PaymentFilter, PaymentSummary};

/// Records what is owed to suppliers of rented-in equipment.
#[derive(Debug, Clone)]
pub struct SettlementTracker {
    repo: Repository,
}

impl SettlementTracker {
    pub(crate) fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Record a pending payment to the supplier of a hire. The supplier is
    /// taken from the hire and cannot be chosen by the caller.
    pub async fn record_payment(
        &self,
        hire_id: HireId,
        payment_date: NaiveDate,
        amount_cents: Cents,
    ) -> Result<SupplierPayment, AppError> {
        let hire = self
            .repo
            .get_hire(hire_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Hire, hire_id))?;
        if hire.supplier_id.is_none() {
            return Err(ValidationError::NoSupplierOnHire(hire_id).into());
        }
        if amount_cents <= 0 {
            return Err(ValidationError::InvalidAmount(amount_cents).into());
        }

        let payment = self
            .repo
            .insert_supplier_payment(hire_id, payment_date, amount_cents)
            .await?
            .ok_or(ValidationError::NoSupplierOnHire(hire_id))?;

        info!(
            payment_id = payment.id,
            hire_id,
            supplier_id = payment.supplier_id,
            amount_cents,
            "Supplier payment recorded"
        );
        Ok(payment)
    }

    pub async fn get_payment(&self, id: PaymentId) -> Result<SupplierPayment, AppError> {
        self.repo
            .get_supplier_payment(id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Payment, id))
    }

    /// Move a payment from Pending to Paid. Paid is final.
    pub async fn update_payment_status(
        &self,
        id: PaymentId,
        next: SettlementStatus,
    ) -> Result<SupplierPayment, AppError> {
        for _ in 0..TRANSITION_ATTEMPTS {
            let mut payment = self.get_payment(id).await?;
            let current = payment.status;
            if !current.can_transition_to(next) {
                return Err(ValidationError::InvalidTransition {
                    entity: Entity::Payment,
                    from: current.to_string(),
                    to: next.to_string(),
                }
                .into());
            }
            if current == next {
                return Ok(payment);
            }

            match self
                .repo
                .compare_and_set_payment_status(id, current, next)
                .await?
            {
                StatusUpdate::Applied => {
                    info!(payment_id = id, from = %current, to = %next, "Supplier payment status changed");
                    payment.status = next;
                    return Ok(payment);
                }
                StatusUpdate::Stale => {
                    debug!(payment_id = id, "Payment status changed concurrently, re-reading");
                }
                StatusUpdate::Missing => return Err(AppError::not_found(Entity::Payment, id)),
            }
        }

        Err(AppError::Conflict(format!(
            "supplier payment {} kept changing status concurrently",
            id
        )))
    }

    /// Administrative override: set any status, including Paid -> Pending.
    pub async fn override_payment_status(
        &self,
        id: PaymentId,
        status: SettlementStatus,
    ) -> Result<SupplierPayment, AppError> {
        if !self.repo.force_payment_status(id, status).await? {
            return Err(AppError::not_found(Entity::Payment, id));
        }
        warn!(payment_id = id, to = %status, "Supplier payment status overridden");
        self.get_payment(id).await
    }

    pub async fn list_payments(
        &self,
        filter: &PaymentFilter,
    ) -> Result<Vec<PaymentSummary>, AppError> {
        let rows = self
            .repo
            .list_supplier_payments(non_empty(&filter.supplier_name), non_empty(&filter.status))
            .await?;
        Ok(rows
            .into_iter()
            .map(|(payment, supplier_name)| PaymentSummary {
                payment,
                supplier_name,
            })
            .collect())
    }
}
