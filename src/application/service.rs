use tracing::info;

use crate::config::StoreConfig;
use crate::domain::{
    Customer, CustomerId, Driver, DriverId, Entity, Fleet, Ownership, ReferenceKey, Supplier,
    SupplierId, ValidationError,
};
use crate::storage::Repository;

use super::{AppError, HireLedger, IntegrityReport, InvoiceSequencer, SettlementTracker};

/// Entry point for any client (CLI, tests, a future API).
///
/// Owns the reference store operations and hands out the three workflow
/// components, which share one connection pool.
#[derive(Debug, Clone)]
pub struct FleetService {
    repo: Repository,
    hires: HireLedger,
    invoices: InvoiceSequencer,
    settlements: SettlementTracker,
}

impl FleetService {
    /// Create a service over an existing repository.
    pub fn new(repo: Repository, config: &StoreConfig) -> Self {
        Self {
            hires: HireLedger::new(repo.clone()),
            invoices: InvoiceSequencer::new(repo.clone(), config.invoice_attempts),
            settlements: SettlementTracker::new(repo.clone()),
            repo,
        }
    }

    /// Open (creating if needed) and migrate the database described by `config`.
    pub async fn init(config: StoreConfig) -> Result<Self, AppError> {
        let repo = Repository::init(&config).await?;
        Ok(Self::new(repo, &config))
    }

    pub fn hires(&self) -> &HireLedger {
        &self.hires
    }

    pub fn invoices(&self) -> &InvoiceSequencer {
        &self.invoices
    }

    pub fn settlements(&self) -> &SettlementTracker {
        &self.settlements
    }

    pub async fn close(&self) {
        self.repo.close().await;
    }

    // ========================
    // Reference store
    // ========================

    /// Register a fleet asset under its externally assigned identifier.
    pub async fn register_fleet(&self, fleet: Fleet) -> Result<Fleet, AppError> {
        if !self.repo.save_fleet(&fleet).await? {
            return Err(AppError::AlreadyExists {
                entity: Entity::Fleet,
                key: fleet.id,
            });
        }
        info!(fleet_id = %fleet.id, ownership = %fleet.ownership, "Fleet registered");
        Ok(fleet)
    }

    pub async fn register_driver(&self, mut driver: Driver) -> Result<Driver, AppError> {
        self.repo.save_driver(&mut driver).await?;
        info!(driver_id = driver.id, "Driver registered");
        Ok(driver)
    }

    pub async fn register_customer(&self, mut customer: Customer) -> Result<Customer, AppError> {
        self.repo.save_customer(&mut customer).await?;
        info!(customer_id = customer.id, "Customer registered");
        Ok(customer)
    }

    pub async fn register_supplier(&self, mut supplier: Supplier) -> Result<Supplier, AppError> {
        self.repo.save_supplier(&mut supplier).await?;
        info!(supplier_id = supplier.id, "Supplier registered");
        Ok(supplier)
    }

    pub async fn exists(&self, key: ReferenceKey<'_>) -> Result<bool, AppError> {
        Ok(self.repo.exists(key).await?)
    }

    pub async fn get_fleet(&self, id: &str) -> Result<Fleet, AppError> {
        self.repo
            .get_fleet(id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Fleet, id))
    }

    pub async fn get_driver(&self, id: DriverId) -> Result<Driver, AppError> {
        self.repo
            .get_driver(id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Driver, id))
    }

    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, AppError> {
        self.repo
            .get_customer(id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Customer, id))
    }

    pub async fn get_supplier(&self, id: SupplierId) -> Result<Supplier, AppError> {
        self.repo
            .get_supplier(id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Supplier, id))
    }

    /// Change whether an asset is owned or rented in. Refused once any hire
    /// references the asset, since those hires were validated against the
    /// old ownership.
    pub async fn change_fleet_ownership(
        &self,
        id: &str,
        ownership: Ownership,
    ) -> Result<Fleet, AppError> {
        let fleet = self.get_fleet(id).await?;
        if fleet.ownership == ownership {
            return Ok(fleet);
        }

        if !self
            .repo
            .update_fleet_ownership_if_unhired(id, ownership)
            .await?
        {
            let hire_count = self.repo.count_hires_for_fleet(id).await?;
            if hire_count == 0 {
                return Err(AppError::not_found(Entity::Fleet, id));
            }
            return Err(ValidationError::OwnershipLocked {
                fleet_id: id.to_string(),
                hire_count,
            }
            .into());
        }

        info!(fleet_id = id, ownership = %ownership, "Fleet ownership changed");
        Ok(Fleet { ownership, ..fleet })
    }

    // ========================
    // Integrity
    // ========================

    /// Check cross-record rules over the whole store.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        let stats = self.repo.get_integrity_stats().await?;
        Ok(IntegrityReport::from_stats(&stats))
    }
}
