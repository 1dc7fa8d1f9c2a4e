mod repository;

pub use repository::*;

/// SQL migration for master records
pub const MIGRATION_001_REFERENCE: &str = include_str!("migrations/001_reference.sql");

/// SQL migration for hires
pub const MIGRATION_002_HIRES: &str = include_str!("migrations/002_hires.sql");

/// SQL migration for customer invoices and supplier payments
pub const MIGRATION_003_SETTLEMENT: &str = include_str!("migrations/003_settlement.sql");
