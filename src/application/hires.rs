use tracing::{debug, info, warn};

use crate::domain::{
    Entity, Hire, HireId, HireRequest, HireStatus, Lifecycle, NewHire, ReferenceKey,
    ValidationError,
};
use crate::storage::{Repository, StatusUpdate};

use super::views::non_empty;
use super::{AppError, HireFilter, HireSummary};

/// Attempts at a compare-and-set status change before reporting a conflict.
pub(crate) const TRANSITION_ATTEMPTS: u32 = 3;

/// Creates hires and moves them through their status lifecycle.
#[derive(Debug, Clone)]
pub struct HireLedger {
    repo: Repository,
}

impl HireLedger {
    pub(crate) fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Validate and record a new hire in status Open.
    ///
    /// Checks run in a fixed order: fleet, driver, customer, supplier (as
    /// required by the fleet's ownership), then the hire's own terms. Nothing
    /// is written unless every check passes.
    pub async fn create_hire(&self, request: HireRequest) -> Result<Hire, AppError> {
        let fleet = self
            .repo
            .get_fleet(&request.fleet_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Fleet, &request.fleet_id))?;

        self.require(ReferenceKey::Driver(request.driver_id)).await?;
        self.require(ReferenceKey::Customer(request.customer_id))
            .await?;

        if fleet.ownership.requires_supplier() {
            let known = match request.supplier_id {
                Some(id) => self.repo.exists(ReferenceKey::Supplier(id)).await?,
                None => false,
            };
            if !known {
                return Err(ValidationError::SupplierRequired {
                    fleet_id: fleet.id.clone(),
                }
                .into());
            }
        } else if let Some(id) = request.supplier_id {
            self.require(ReferenceKey::Supplier(id)).await?;
        }

        let terms = request.terms()?;
        let new_hire = NewHire {
            fleet_id: request.fleet_id,
            driver_id: request.driver_id,
            customer_id: request.customer_id,
            supplier_id: request.supplier_id,
            terms,
        };

        let id = self
            .repo
            .insert_hire(&new_hire, fleet.ownership)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "ownership of fleet {} changed while the hire was being created",
                    new_hire.fleet_id
                ))
            })?;

        let hire = new_hire.into_hire(id);
        info!(
            hire_id = hire.id,
            fleet_id = %hire.fleet_id,
            total_cents = hire.total_cents,
            "Hire created"
        );
        Ok(hire)
    }

    pub async fn get_hire(&self, id: HireId) -> Result<Hire, AppError> {
        self.repo
            .get_hire(id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Hire, id))
    }

    /// Move a hire to `next` following the status table:
    /// Open -> Completed | Cancelled. Completed and Cancelled are final.
    pub async fn transition_status(&self, id: HireId, next: HireStatus) -> Result<Hire, AppError> {
        for _ in 0..TRANSITION_ATTEMPTS {
            let mut hire = self.get_hire(id).await?;
            if !hire.status.can_transition_to(next) {
                return Err(ValidationError::InvalidTransition {
                    entity: Entity::Hire,
                    from: hire.status.to_string(),
                    to: next.to_string(),
                }
                .into());
            }
            if hire.status == next {
                return Ok(hire);
            }

            match self
                .repo
                .compare_and_set_hire_status(id, hire.status, next)
                .await?
            {
                StatusUpdate::Applied => {
                    info!(hire_id = id, from = %hire.status, to = %next, "Hire status changed");
                    hire.status = next;
                    return Ok(hire);
                }
                StatusUpdate::Stale => {
                    debug!(hire_id = id, "Hire status changed concurrently, re-reading");
                }
                StatusUpdate::Missing => return Err(AppError::not_found(Entity::Hire, id)),
            }
        }

        Err(AppError::Conflict(format!(
            "hire {} kept changing status concurrently",
            id
        )))
    }

    /// Administrative override: set any status regardless of the table.
    pub async fn override_status(&self, id: HireId, status: HireStatus) -> Result<Hire, AppError> {
        if !self.repo.force_hire_status(id, status).await? {
            return Err(AppError::not_found(Entity::Hire, id));
        }
        warn!(hire_id = id, to = %status, "Hire status overridden");
        self.get_hire(id).await
    }

    /// List hires with customer names, optionally filtered by status.
    pub async fn list_hires(&self, filter: &HireFilter) -> Result<Vec<HireSummary>, AppError> {
        let rows = self.repo.list_hires(non_empty(&filter.status)).await?;
        Ok(rows
            .into_iter()
            .map(|(hire, customer_name)| HireSummary {
                hire,
                customer_name,
            })
            .collect())
    }

    async fn require(&self, key: ReferenceKey<'_>) -> Result<(), AppError> {
        if self.repo.exists(key).await? {
            Ok(())
        } else {
            Err(AppError::not_found(key.entity(), key))
        }
    }
}
