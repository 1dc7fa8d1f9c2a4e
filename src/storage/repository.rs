use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::domain::{
    Cents, Customer, CustomerId, CustomerInvoice, Driver, DriverId, Fleet, Hire, HireId,
    HireStatus, HireType, InvoiceId, NewHire, Ownership, PaymentId, PaymentStatus, ReferenceKey,
    SettlementStatus, Supplier, SupplierId, SupplierPayment,
};

use super::{MIGRATION_001_REFERENCE, MIGRATION_002_HIRES, MIGRATION_003_SETTLEMENT};

const HIRE_COLUMNS: &str = "h.id, h.fleet_id, h.driver_id, h.customer_id, h.supplier_id, h.hire_type, h.start_date, h.end_date, h.rate_cents, h.quantity, h.total_cents, h.status";

const INVOICE_COLUMNS: &str =
    "i.id, i.invoice_no, i.hire_id, i.customer_id, i.invoice_date, i.amount_cents, i.payment_status";

const PAYMENT_COLUMNS: &str =
    "p.id, p.supplier_id, p.hire_id, p.payment_date, p.amount_cents, p.status";

/// Outcome of the conditional invoice insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceInsert {
    Inserted(CustomerInvoice),
    /// Another writer already holds this invoice number.
    NumberTaken,
    /// The hire is missing, not completed, or already invoiced.
    Ineligible,
}

/// Outcome of a compare-and-set status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Applied,
    /// The row exists but no longer had the expected status.
    Stale,
    Missing,
}

/// Counts of rows that break the engine's cross-record rules.
#[derive(Debug, Clone, Default)]
pub struct IntegrityStats {
    pub hire_count: i64,
    pub invoice_count: i64,
    pub payment_count: i64,
    pub rented_in_hires_without_supplier: i64,
    pub invoices_on_open_hires: i64,
    pub invoice_amount_mismatches: i64,
    pub payment_supplier_mismatches: i64,
    pub malformed_invoice_numbers: i64,
}

/// Repository for the fleet store: master records, hires, invoices and
/// supplier payments.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a connection pool as described by `config`.
    /// The database file is created if it doesn't exist.
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let mut options = if config.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .context("Invalid in-memory database options")?
        } else {
            SqliteConnectOptions::new()
                .filename(&config.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };
        options = options.foreign_keys(true).busy_timeout(config.busy_timeout);

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout);
        if config.is_in_memory() {
            // Dropping the last connection drops the database with it.
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| {
                format!(
                    "Failed to open database at {}",
                    config.database_path.display()
                )
            })?;

        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Database pool opened"
        );
        Ok(Self::new(pool))
    }

    /// Run database migrations. Every statement is idempotent.
    pub async fn migrate(&self) -> Result<()> {
        for (name, sql) in [
            ("001_reference", MIGRATION_001_REFERENCE),
            ("002_hires", MIGRATION_002_HIRES),
            ("003_settlement", MIGRATION_003_SETTLEMENT),
        ] {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to run migration {}", name))?;
            debug!(migration = name, "Migration applied");
        }
        Ok(())
    }

    /// Initialize a database (open + migrate).
    pub async fn init(config: &StoreConfig) -> Result<Self> {
        let repo = Self::open(config).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ========================
    // Reference store
    // ========================

    /// Check whether a master record exists.
    pub async fn exists(&self, key: ReferenceKey<'_>) -> Result<bool> {
        let query = match key {
            ReferenceKey::Fleet(id) => {
                sqlx::query("SELECT EXISTS(SELECT 1 FROM fleets WHERE id = ?) AS found").bind(id)
            }
            ReferenceKey::Driver(id) => {
                sqlx::query("SELECT EXISTS(SELECT 1 FROM drivers WHERE id = ?) AS found").bind(id)
            }
            ReferenceKey::Customer(id) => {
                sqlx::query("SELECT EXISTS(SELECT 1 FROM customers WHERE id = ?) AS found")
                    .bind(id)
            }
            ReferenceKey::Supplier(id) => {
                sqlx::query("SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = ?) AS found")
                    .bind(id)
            }
        };

        let row = query
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to look up {} {}", key.entity(), key))?;
        Ok(row.get::<i64, _>("found") != 0)
    }

    /// Save a new fleet asset. The identifier is assigned by the caller.
    /// Returns false if the identifier is already taken.
    pub async fn save_fleet(&self, fleet: &Fleet) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO fleets (id, serial_no, fleet_type, ownership, capacity, status)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&fleet.id)
        .bind(&fleet.serial_no)
        .bind(&fleet.fleet_type)
        .bind(fleet.ownership.as_str())
        .bind(fleet.capacity)
        .bind(&fleet.status)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) if is_unique_violation(&err, "fleets.id") => Ok(false),
            Err(err) => Err(err).context("Failed to save fleet"),
        }
    }

    pub async fn get_fleet(&self, id: &str) -> Result<Option<Fleet>> {
        let row = sqlx::query(
            "SELECT id, serial_no, fleet_type, ownership, capacity, status FROM fleets WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch fleet")?;

        row.as_ref().map(Self::row_to_fleet).transpose()
    }

    /// Change a fleet's ownership, but only while no hire references it.
    /// Returns false when the fleet is missing or already hired.
    pub async fn update_fleet_ownership_if_unhired(
        &self,
        id: &str,
        ownership: Ownership,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE fleets SET ownership = ?
            WHERE id = ? AND NOT EXISTS (SELECT 1 FROM hires WHERE fleet_id = ?)
            "#,
        )
        .bind(ownership.as_str())
        .bind(id)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update fleet ownership")?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn count_hires_for_fleet(&self, id: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM hires WHERE fleet_id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count hires for fleet")?;
        Ok(row.get("count"))
    }

    /// Save a new driver and assign its identifier.
    pub async fn save_driver(&self, driver: &mut Driver) -> Result<()> {
        let row = sqlx::query(
            "INSERT INTO drivers (name, phone_no, status, notes) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(&driver.name)
        .bind(&driver.phone_no)
        .bind(&driver.status)
        .bind(&driver.notes)
        .fetch_one(&self.pool)
        .await
        .context("Failed to save driver")?;
        driver.id = row.get("id");
        Ok(())
    }

    pub async fn get_driver(&self, id: DriverId) -> Result<Option<Driver>> {
        let row = sqlx::query("SELECT id, name, phone_no, status, notes FROM drivers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch driver")?;

        Ok(row.map(|row| Driver {
            id: row.get("id"),
            name: row.get("name"),
            phone_no: row.get("phone_no"),
            status: row.get("status"),
            notes: row.get("notes"),
        }))
    }

    /// Save a new customer and assign its identifier.
    pub async fn save_customer(&self, customer: &mut Customer) -> Result<()> {
        let row = sqlx::query(
            "INSERT INTO customers (name, phone_no, email, address) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(&customer.name)
        .bind(&customer.phone_no)
        .bind(&customer.email)
        .bind(&customer.address)
        .fetch_one(&self.pool)
        .await
        .context("Failed to save customer")?;
        customer.id = row.get("id");
        Ok(())
    }

    pub async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row =
            sqlx::query("SELECT id, name, phone_no, email, address FROM customers WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to fetch customer")?;

        Ok(row.map(|row| Customer {
            id: row.get("id"),
            name: row.get("name"),
            phone_no: row.get("phone_no"),
            email: row.get("email"),
            address: row.get("address"),
        }))
    }

    /// Save a new supplier and assign its identifier.
    pub async fn save_supplier(&self, supplier: &mut Supplier) -> Result<()> {
        let row = sqlx::query(
            r#"
            INSERT INTO suppliers (company_name, contact_person, phone_no, email)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&supplier.company_name)
        .bind(&supplier.contact_person)
        .bind(&supplier.phone_no)
        .bind(&supplier.email)
        .fetch_one(&self.pool)
        .await
        .context("Failed to save supplier")?;
        supplier.id = row.get("id");
        Ok(())
    }

    pub async fn get_supplier(&self, id: SupplierId) -> Result<Option<Supplier>> {
        let row = sqlx::query(
            "SELECT id, company_name, contact_person, phone_no, email FROM suppliers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch supplier")?;

        Ok(row.map(|row| Supplier {
            id: row.get("id"),
            company_name: row.get("company_name"),
            contact_person: row.get("contact_person"),
            phone_no: row.get("phone_no"),
            email: row.get("email"),
        }))
    }

    fn row_to_fleet(row: &SqliteRow) -> Result<Fleet> {
        let ownership_str: String = row.get("ownership");
        Ok(Fleet {
            id: row.get("id"),
            serial_no: row.get("serial_no"),
            fleet_type: row.get("fleet_type"),
            ownership: Ownership::from_str(&ownership_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid ownership: {}", ownership_str))?,
            capacity: row.get("capacity"),
            status: row.get("status"),
        })
    }

    // ========================
    // Hire operations
    // ========================

    /// Insert a validated hire, provided the fleet still has the ownership
    /// the hire was validated against. Returns `None` if it changed.
    pub async fn insert_hire(
        &self,
        hire: &NewHire,
        validated_ownership: Ownership,
    ) -> Result<Option<HireId>> {
        let row = sqlx::query(
            r#"
            INSERT INTO hires (fleet_id, driver_id, customer_id, supplier_id, hire_type, start_date, end_date, rate_cents, quantity, total_cents, status)
            SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'Open'
            WHERE EXISTS (SELECT 1 FROM fleets WHERE id = ? AND ownership = ?)
            RETURNING id
            "#,
        )
        .bind(&hire.fleet_id)
        .bind(hire.driver_id)
        .bind(hire.customer_id)
        .bind(hire.supplier_id)
        .bind(hire.terms.hire_type.as_str())
        .bind(hire.terms.start_date.to_string())
        .bind(hire.terms.end_date.map(|d| d.to_string()))
        .bind(hire.terms.rate_cents)
        .bind(hire.terms.quantity)
        .bind(hire.terms.total_cents)
        .bind(&hire.fleet_id)
        .bind(validated_ownership.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to save hire")?;

        Ok(row.map(|row| row.get("id")))
    }

    pub async fn get_hire(&self, id: HireId) -> Result<Option<Hire>> {
        let sql = format!("SELECT {} FROM hires h WHERE h.id = ?", HIRE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch hire")?;

        row.as_ref().map(Self::row_to_hire).transpose()
    }

    /// List hires with their customer's name, ordered by id.
    /// `status` is a case-sensitive substring of the status label.
    pub async fn list_hires(&self, status: Option<&str>) -> Result<Vec<(Hire, String)>> {
        let mut sql = format!(
            "SELECT {}, c.name AS customer_name FROM hires h JOIN customers c ON c.id = h.customer_id WHERE 1=1",
            HIRE_COLUMNS
        );
        if status.is_some() {
            sql.push_str(" AND instr(h.status, ?) > 0");
        }
        sql.push_str(" ORDER BY h.id");

        let mut query = sqlx::query(&sql);
        if let Some(status) = status {
            query = query.bind(status);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list hires")?;

        rows.iter()
            .map(|row| Ok((Self::row_to_hire(row)?, row.get("customer_name"))))
            .collect()
    }

    /// Set a hire's status if it still equals `expected`.
    pub async fn compare_and_set_hire_status(
        &self,
        id: HireId,
        expected: HireStatus,
        next: HireStatus,
    ) -> Result<StatusUpdate> {
        let result = sqlx::query("UPDATE hires SET status = ? WHERE id = ? AND status = ?")
            .bind(next.as_str())
            .bind(id)
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
            .context("Failed to update hire status")?;

        self.status_update_outcome(result.rows_affected(), "hires", id)
            .await
    }

    /// Set a hire's status unconditionally. Returns false if the hire is missing.
    pub async fn force_hire_status(&self, id: HireId, status: HireStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE hires SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to override hire status")?;
        Ok(result.rows_affected() == 1)
    }

    fn row_to_hire(row: &SqliteRow) -> Result<Hire> {
        let hire_type_str: String = row.get("hire_type");
        let status_str: String = row.get("status");
        let start_date_str: String = row.get("start_date");
        let end_date_str: Option<String> = row.get("end_date");

        Ok(Hire {
            id: row.get("id"),
            fleet_id: row.get("fleet_id"),
            driver_id: row.get("driver_id"),
            customer_id: row.get("customer_id"),
            supplier_id: row.get("supplier_id"),
            hire_type: HireType::from_str(&hire_type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid hire type: {}", hire_type_str))?,
            start_date: parse_stored_date(&start_date_str).context("Invalid start_date")?,
            end_date: end_date_str
                .as_deref()
                .map(parse_stored_date)
                .transpose()
                .context("Invalid end_date")?,
            rate_cents: row.get("rate_cents"),
            quantity: row.get("quantity"),
            total_cents: row.get("total_cents"),
            status: HireStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid hire status: {}", status_str))?,
        })
    }

    // ========================
    // Invoice operations
    // ========================

    /// Invoice number of the most recently created invoice.
    pub async fn last_invoice_number(&self) -> Result<Option<String>> {
        let row = sqlx::query("SELECT invoice_no FROM customer_invoices ORDER BY id DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch last invoice number")?;
        Ok(row.map(|row| row.get("invoice_no")))
    }

    /// Insert an invoice for a hire in a single statement that re-checks the
    /// hire is completed and not yet invoiced. Amount and customer are copied
    /// from the hire row as it is at that moment.
    pub async fn insert_invoice_for_hire(
        &self,
        invoice_no: &str,
        hire_id: HireId,
        invoice_date: NaiveDate,
    ) -> Result<InvoiceInsert> {
        let result = sqlx::query(
            r#"
            INSERT INTO customer_invoices (invoice_no, hire_id, customer_id, invoice_date, amount_cents, payment_status)
            SELECT ?, h.id, h.customer_id, ?, h.total_cents, 'Unpaid'
            FROM hires h
            WHERE h.id = ?
              AND h.status = 'Completed'
              AND NOT EXISTS (SELECT 1 FROM customer_invoices i WHERE i.hire_id = h.id)
            RETURNING id, invoice_no, hire_id, customer_id, invoice_date, amount_cents, payment_status
            "#,
        )
        .bind(invoice_no)
        .bind(invoice_date.to_string())
        .bind(hire_id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(row)) => Ok(InvoiceInsert::Inserted(Self::row_to_invoice(&row)?)),
            Ok(None) => Ok(InvoiceInsert::Ineligible),
            Err(err) if is_unique_violation(&err, "invoice_no") => Ok(InvoiceInsert::NumberTaken),
            Err(err) if is_unique_violation(&err, "hire_id") => Ok(InvoiceInsert::Ineligible),
            Err(err) => Err(err).context("Failed to save invoice"),
        }
    }

    pub async fn get_invoice(&self, id: InvoiceId) -> Result<Option<CustomerInvoice>> {
        let sql = format!(
            "SELECT {} FROM customer_invoices i WHERE i.id = ?",
            INVOICE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch invoice")?;

        row.as_ref().map(Self::row_to_invoice).transpose()
    }

    pub async fn get_invoice_for_hire(&self, hire_id: HireId) -> Result<Option<CustomerInvoice>> {
        let sql = format!(
            "SELECT {} FROM customer_invoices i WHERE i.hire_id = ?",
            INVOICE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(hire_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch invoice for hire")?;

        row.as_ref().map(Self::row_to_invoice).transpose()
    }

    /// List invoices with their customer's name, ordered by creation.
    /// Both filters are case-sensitive substrings and are combined with AND.
    pub async fn list_invoices(
        &self,
        payment_status: Option<&str>,
        customer_name: Option<&str>,
    ) -> Result<Vec<(CustomerInvoice, String)>> {
        let mut sql = format!(
            "SELECT {}, c.name AS customer_name FROM customer_invoices i JOIN customers c ON c.id = i.customer_id WHERE 1=1",
            INVOICE_COLUMNS
        );
        if payment_status.is_some() {
            sql.push_str(" AND instr(i.payment_status, ?) > 0");
        }
        if customer_name.is_some() {
            sql.push_str(" AND instr(c.name, ?) > 0");
        }
        sql.push_str(" ORDER BY i.id");

        let mut query = sqlx::query(&sql);
        if let Some(status) = payment_status {
            query = query.bind(status);
        }
        if let Some(name) = customer_name {
            query = query.bind(name);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list invoices")?;

        rows.iter()
            .map(|row| Ok((Self::row_to_invoice(row)?, row.get("customer_name"))))
            .collect()
    }

    pub async fn compare_and_set_invoice_status(
        &self,
        id: InvoiceId,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> Result<StatusUpdate> {
        let result = sqlx::query(
            "UPDATE customer_invoices SET payment_status = ? WHERE id = ? AND payment_status = ?",
        )
        .bind(next.as_str())
        .bind(id)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to update invoice status")?;

        self.status_update_outcome(result.rows_affected(), "customer_invoices", id)
            .await
    }

    pub async fn force_invoice_status(&self, id: InvoiceId, status: PaymentStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE customer_invoices SET payment_status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to override invoice status")?;
        Ok(result.rows_affected() == 1)
    }

    fn row_to_invoice(row: &SqliteRow) -> Result<CustomerInvoice> {
        let date_str: String = row.get("invoice_date");
        let status_str: String = row.get("payment_status");

        Ok(CustomerInvoice {
            id: row.get("id"),
            invoice_no: row.get("invoice_no"),
            hire_id: row.get("hire_id"),
            customer_id: row.get("customer_id"),
            invoice_date: parse_stored_date(&date_str).context("Invalid invoice_date")?,
            amount_cents: row.get("amount_cents"),
            payment_status: PaymentStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid payment status: {}", status_str))?,
        })
    }

    // ========================
    // Supplier payment operations
    // ========================

    /// Insert a pending payment to the supplier recorded on the hire.
    /// Returns `None` when the hire is missing or has no supplier.
    pub async fn insert_supplier_payment(
        &self,
        hire_id: HireId,
        payment_date: NaiveDate,
        amount_cents: Cents,
    ) -> Result<Option<SupplierPayment>> {
        let row = sqlx::query(
            r#"
            INSERT INTO supplier_payments (supplier_id, hire_id, payment_date, amount_cents, status)
            SELECT h.supplier_id, h.id, ?, ?, 'Pending'
            FROM hires h
            WHERE h.id = ? AND h.supplier_id IS NOT NULL
            RETURNING id, supplier_id, hire_id, payment_date, amount_cents, status
            "#,
        )
        .bind(payment_date.to_string())
        .bind(amount_cents)
        .bind(hire_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to save supplier payment")?;

        row.as_ref().map(Self::row_to_payment).transpose()
    }

    pub async fn get_supplier_payment(&self, id: PaymentId) -> Result<Option<SupplierPayment>> {
        let sql = format!(
            "SELECT {} FROM supplier_payments p WHERE p.id = ?",
            PAYMENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch supplier payment")?;

        row.as_ref().map(Self::row_to_payment).transpose()
    }

    /// List supplier payments with the supplier's company name.
    /// Both filters are case-sensitive substrings and are combined with AND.
    pub async fn list_supplier_payments(
        &self,
        supplier_name: Option<&str>,
        status: Option<&str>,
    ) -> Result<Vec<(SupplierPayment, String)>> {
        let mut sql = format!(
            "SELECT {}, s.company_name AS supplier_name FROM supplier_payments p JOIN suppliers s ON s.id = p.supplier_id WHERE 1=1",
            PAYMENT_COLUMNS
        );
        if supplier_name.is_some() {
            sql.push_str(" AND instr(s.company_name, ?) > 0");
        }
        if status.is_some() {
            sql.push_str(" AND instr(p.status, ?) > 0");
        }
        sql.push_str(" ORDER BY p.id");

        let mut query = sqlx::query(&sql);
        if let Some(name) = supplier_name {
            query = query.bind(name);
        }
        if let Some(status) = status {
            query = query.bind(status);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list supplier payments")?;

        rows.iter()
            .map(|row| Ok((Self::row_to_payment(row)?, row.get("supplier_name"))))
            .collect()
    }

    pub async fn compare_and_set_payment_status(
        &self,
        id: PaymentId,
        expected: SettlementStatus,
        next: SettlementStatus,
    ) -> Result<StatusUpdate> {
        let result =
            sqlx::query("UPDATE supplier_payments SET status = ? WHERE id = ? AND status = ?")
                .bind(next.as_str())
                .bind(id)
                .bind(expected.as_str())
                .execute(&self.pool)
                .await
                .context("Failed to update supplier payment status")?;

        self.status_update_outcome(result.rows_affected(), "supplier_payments", id)
            .await
    }

    pub async fn force_payment_status(
        &self,
        id: PaymentId,
        status: SettlementStatus,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE supplier_payments SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to override supplier payment status")?;
        Ok(result.rows_affected() == 1)
    }

    fn row_to_payment(row: &SqliteRow) -> Result<SupplierPayment> {
        let date_str: String = row.get("payment_date");
        let status_str: String = row.get("status");

        Ok(SupplierPayment {
            id: row.get("id"),
            supplier_id: row.get("supplier_id"),
            hire_id: row.get("hire_id"),
            payment_date: parse_stored_date(&date_str).context("Invalid payment_date")?,
            amount_cents: row.get("amount_cents"),
            status: SettlementStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid supplier payment status: {}", status_str))?,
        })
    }

    // ========================
    // Integrity
    // ========================

    /// Get statistics for integrity checking.
    pub async fn get_integrity_stats(&self) -> Result<IntegrityStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM hires) AS hire_count,
                (SELECT COUNT(*) FROM customer_invoices) AS invoice_count,
                (SELECT COUNT(*) FROM supplier_payments) AS payment_count,
                (SELECT COUNT(*) FROM hires h JOIN fleets f ON f.id = h.fleet_id
                    WHERE f.ownership = 'Rented-in' AND h.supplier_id IS NULL) AS rented_in_without_supplier,
                (SELECT COUNT(*) FROM customer_invoices i JOIN hires h ON h.id = i.hire_id
                    WHERE h.status <> 'Completed') AS invoices_on_open_hires,
                (SELECT COUNT(*) FROM customer_invoices i JOIN hires h ON h.id = i.hire_id
                    WHERE i.amount_cents <> h.total_cents OR i.customer_id <> h.customer_id) AS amount_mismatches,
                (SELECT COUNT(*) FROM supplier_payments p JOIN hires h ON h.id = p.hire_id
                    WHERE h.supplier_id IS NULL OR p.supplier_id <> h.supplier_id) AS supplier_mismatches,
                (SELECT COUNT(*) FROM customer_invoices
                    WHERE invoice_no NOT GLOB 'INV-[0-9][0-9][0-9][0-9]*'
                       OR substr(invoice_no, 5) GLOB '*[^0-9]*') AS malformed_numbers
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute integrity statistics")?;

        Ok(IntegrityStats {
            hire_count: row.get("hire_count"),
            invoice_count: row.get("invoice_count"),
            payment_count: row.get("payment_count"),
            rented_in_hires_without_supplier: row.get("rented_in_without_supplier"),
            invoices_on_open_hires: row.get("invoices_on_open_hires"),
            invoice_amount_mismatches: row.get("amount_mismatches"),
            payment_supplier_mismatches: row.get("supplier_mismatches"),
            malformed_invoice_numbers: row.get("malformed_numbers"),
        })
    }

    /// Distinguish a stale compare-and-set from a missing row.
    async fn status_update_outcome(
        &self,
        rows_affected: u64,
        table: &'static str,
        id: i64,
    ) -> Result<StatusUpdate> {
        if rows_affected == 1 {
            return Ok(StatusUpdate::Applied);
        }
        // `table` is always one of the engine's own table names.
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?) AS found", table);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to re-read row {} of {}", id, table))?;

        if row.get::<i64, _>("found") != 0 {
            Ok(StatusUpdate::Stale)
        } else {
            Ok(StatusUpdate::Missing)
        }
    }
}

fn parse_stored_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Invalid date: {}", s))
}

fn is_unique_violation(err: &sqlx::Error, column: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.message().contains(column)
        }
        _ => false,
    }
}
