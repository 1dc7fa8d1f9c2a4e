// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use fleetdesk::application::FleetService;
use fleetdesk::config::StoreConfig;
use fleetdesk::domain::{Customer, Driver, Fleet, Hire, HireRequest, HireStatus, Ownership, Supplier};
use tempfile::TempDir;

/// Write an invoice row straight into the database behind `temp`, as an
/// import or another process would, bypassing the sequencer.
pub async fn insert_raw_invoice(
    temp: &TempDir,
    invoice_no: &str,
    hire: &Hire,
) -> Result<()> {
    let url = format!("sqlite://{}", temp.path().join("test.db").display());
    let pool = sqlx::SqlitePool::connect(&url).await?;
    sqlx::query(
        "INSERT INTO customer_invoices (invoice_no, hire_id, customer_id, invoice_date, amount_cents, payment_status)
         VALUES (?, ?, ?, '2024-03-11', ?, 'Unpaid')",
    )
    .bind(invoice_no)
    .bind(hire.id)
    .bind(hire.customer_id)
    .bind(hire.total_cents)
    .execute(&pool)
    .await?;
    pool.close().await;
    Ok(())
}

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(FleetService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = FleetService::init(StoreConfig::new(db_path)).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a YYYY-MM-DD date
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Test fixture: a small yard with one asset of each ownership.
///
/// - F1: rented-in excavator, supplied by "Northern Plant Hire"
/// - F2: owned truck
/// - one driver, customers "Acme Builders" and "Beta Roads"
pub struct StandardFleet {
    pub driver_id: i64,
    pub acme_id: i64,
    pub beta_id: i64,
    pub supplier_id: i64,
}

impl StandardFleet {
    pub async fn create(service: &FleetService) -> Result<Self> {
        service
            .register_fleet(
                Fleet::new("F1", Ownership::RentedIn)
                    .with_fleet_type("Excavator")
                    .with_serial_no("EX-2201"),
            )
            .await?;
        service
            .register_fleet(Fleet::new("F2", Ownership::Owned).with_fleet_type("Truck"))
            .await?;

        let driver = service
            .register_driver(Driver::new("Sam Okafor").with_phone_no("555-0101"))
            .await?;
        let acme = service
            .register_customer(Customer::new("Acme Builders").with_email("ap@acme.test"))
            .await?;
        let beta = service
            .register_customer(Customer::new("Beta Roads"))
            .await?;
        let supplier = service
            .register_supplier(
                Supplier::new("Northern Plant Hire").with_contact_person("J. Mwangi"),
            )
            .await?;

        Ok(Self {
            driver_id: driver.id,
            acme_id: acme.id,
            beta_id: beta.id,
            supplier_id: supplier.id,
        })
    }

    /// Daily hire of the rented-in excavator for Acme: 150.00 x 3 days.
    pub fn rented_in_request(&self) -> HireRequest {
        HireRequest::new(
            "F1",
            self.driver_id,
            self.acme_id,
            "Daily",
            parse_date("2024-03-01"),
            15000,
        )
        .with_supplier(self.supplier_id)
        .with_end_date(parse_date("2024-03-03"))
        .with_quantity(3)
    }

    /// Trip hire of the owned truck for the given customer.
    pub fn owned_request(&self, customer_id: i64, rate_cents: i64) -> HireRequest {
        HireRequest::new(
            "F2",
            self.driver_id,
            customer_id,
            "Trip",
            parse_date("2024-03-05"),
            rate_cents,
        )
    }

    /// Create a hire and move it to Completed, ready for invoicing.
    pub async fn completed_hire(service: &FleetService, request: HireRequest) -> Result<Hire> {
        let hire = service.hires().create_hire(request).await?;
        let hire = service
            .hires()
            .transition_status(hire.id, HireStatus::Completed)
            .await?;
        Ok(hire)
    }
}
