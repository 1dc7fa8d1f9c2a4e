use std::io;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use crate::application::{
    FleetService, HireFilter, HireSummary, InvoiceFilter, InvoiceSummary, PaymentFilter,
    PaymentSummary,
};
use crate::config::{StoreConfig, DEFAULT_DATABASE};
use crate::domain::{
    format_cents, parse_cents, Customer, Driver, Fleet, HireRequest, HireStatus, Ownership,
    PaymentStatus, SettlementStatus, Supplier,
};

/// Fleetdesk - rental fleet hire-to-settlement
#[derive(Parser)]
#[command(name = "fleetdesk")]
#[command(about = "Track equipment hires, customer invoices and supplier payments")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "FLEETDESK_DB", default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Fleet asset commands
    #[command(subcommand)]
    Fleet(FleetCommands),

    /// Driver commands
    #[command(subcommand)]
    Driver(DriverCommands),

    /// Customer commands
    #[command(subcommand)]
    Customer(CustomerCommands),

    /// Supplier commands
    #[command(subcommand)]
    Supplier(SupplierCommands),

    /// Hire commands
    #[command(subcommand)]
    Hire(HireCommands),

    /// Customer invoice commands
    #[command(subcommand)]
    Invoice(InvoiceCommands),

    /// Supplier payment commands
    #[command(subcommand)]
    Payment(PaymentCommands),

    /// Verify cross-record consistency
    Check,
}

#[derive(Subcommand)]
pub enum FleetCommands {
    /// Register a fleet asset
    Add {
        /// Asset identifier (e.g., "F1")
        id: String,

        /// Ownership: owned, rented-in
        #[arg(short, long)]
        ownership: String,

        /// Serial number
        #[arg(long)]
        serial_no: Option<String>,

        /// Asset type (e.g., "Excavator")
        #[arg(short = 't', long = "type")]
        fleet_type: Option<String>,

        /// Capacity in the asset's own unit
        #[arg(long)]
        capacity: Option<f64>,

        /// Free-form operational status
        #[arg(long)]
        status: Option<String>,
    },

    /// Show a fleet asset
    Show {
        /// Asset identifier
        id: String,
    },

    /// Change ownership of an asset that has never been hired
    Ownership {
        /// Asset identifier
        id: String,

        /// New ownership: owned, rented-in
        ownership: String,
    },
}

#[derive(Subcommand)]
pub enum DriverCommands {
    /// Register a driver
    Add {
        name: String,

        #[arg(long)]
        phone_no: Option<String>,

        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CustomerCommands {
    /// Register a customer
    Add {
        name: String,

        #[arg(long)]
        phone_no: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SupplierCommands {
    /// Register a supplier
    Add {
        company_name: String,

        #[arg(long)]
        contact_person: Option<String>,

        #[arg(long)]
        phone_no: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum HireCommands {
    /// Create a hire in status Open
    Create {
        /// Fleet asset identifier
        #[arg(long)]
        fleet: String,

        /// Driver ID
        #[arg(long)]
        driver: i64,

        /// Customer ID
        #[arg(long)]
        customer: i64,

        /// Supplier ID (required for rented-in assets)
        #[arg(long)]
        supplier: Option<i64>,

        /// Hire type: daily, weekly, monthly, trip
        #[arg(short = 't', long = "type")]
        hire_type: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Rate per unit (e.g., "150.00" or "150")
        #[arg(short, long)]
        rate: String,

        /// Number of units (days, weeks, months or trips)
        #[arg(short, long, default_value = "1")]
        quantity: i64,
    },

    /// Change the status of a hire
    Status {
        /// Hire ID
        id: i64,

        /// New status: open, completed, cancelled
        status: String,

        /// Set the status regardless of the lifecycle
        #[arg(long = "override")]
        force: bool,
    },

    /// List all hires
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Search hires by status
    Search {
        /// Case-sensitive substring of the status
        #[arg(long)]
        status: Option<String>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show a hire
    Show {
        /// Hire ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum InvoiceCommands {
    /// Preview the next invoice number without reserving it
    NextNumber,

    /// Issue an invoice for a completed hire
    Create {
        /// Hire ID
        hire_id: i64,

        /// Invoice date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },

    /// Change the payment status of an invoice
    Status {
        /// Invoice ID
        id: i64,

        /// New status: unpaid, partially-paid, paid
        status: String,

        /// Set the status regardless of the lifecycle
        #[arg(long = "override")]
        force: bool,
    },

    /// List all invoices
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Search invoices by payment status and customer name
    Search {
        /// Case-sensitive substring of the payment status
        #[arg(long)]
        status: Option<String>,

        /// Case-sensitive substring of the customer name
        #[arg(long)]
        customer: Option<String>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Subcommand)]
pub enum PaymentCommands {
    /// Record a pending payment to the supplier of a hire
    Record {
        /// Hire ID
        hire_id: i64,

        /// Payment date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Amount owed (e.g., "300.00")
        #[arg(short, long)]
        amount: String,
    },

    /// Change the status of a supplier payment
    Status {
        /// Payment ID
        id: i64,

        /// New status: pending, paid
        status: String,

        /// Set the status regardless of the lifecycle
        #[arg(long = "override")]
        force: bool,
    },

    /// List all supplier payments
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Search supplier payments by supplier name and status
    Search {
        /// Case-sensitive substring of the supplier company name
        #[arg(long)]
        supplier: Option<String>,

        /// Case-sensitive substring of the status
        #[arg(long)]
        status: Option<String>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = StoreConfig::new(&self.database);
        let service = FleetService::init(config)
            .await
            .with_context(|| format!("Failed to open database: {}", self.database))?;

        let outcome = match self.command {
            Commands::Init => {
                println!("Database initialized: {}", self.database);
                Ok(())
            }
            Commands::Fleet(cmd) => run_fleet_command(&service, cmd).await,
            Commands::Driver(cmd) => run_driver_command(&service, cmd).await,
            Commands::Customer(cmd) => run_customer_command(&service, cmd).await,
            Commands::Supplier(cmd) => run_supplier_command(&service, cmd).await,
            Commands::Hire(cmd) => run_hire_command(&service, cmd).await,
            Commands::Invoice(cmd) => run_invoice_command(&service, cmd).await,
            Commands::Payment(cmd) => run_payment_command(&service, cmd).await,
            Commands::Check => run_check_command(&service).await,
        };

        service.close().await;
        outcome
    }
}

async fn run_fleet_command(service: &FleetService, cmd: FleetCommands) -> Result<()> {
    match cmd {
        FleetCommands::Add {
            id,
            ownership,
            serial_no,
            fleet_type,
            capacity,
            status,
        } => {
            let mut fleet = Fleet::new(id, parse_ownership(&ownership)?);
            fleet.serial_no = serial_no;
            fleet.fleet_type = fleet_type;
            fleet.capacity = capacity;
            fleet.status = status;

            let fleet = service.register_fleet(fleet).await?;
            println!("Registered fleet: {} ({})", fleet.id, fleet.ownership);
        }

        FleetCommands::Show { id } => {
            let fleet = service.get_fleet(&id).await?;
            println!("Fleet: {}", fleet.id);
            println!("  Ownership:  {}", fleet.ownership);
            if let Some(serial_no) = &fleet.serial_no {
                println!("  Serial no:  {}", serial_no);
            }
            if let Some(fleet_type) = &fleet.fleet_type {
                println!("  Type:       {}", fleet_type);
            }
            if let Some(capacity) = fleet.capacity {
                println!("  Capacity:   {}", capacity);
            }
            if let Some(status) = &fleet.status {
                println!("  Status:     {}", status);
            }
        }

        FleetCommands::Ownership { id, ownership } => {
            let fleet = service
                .change_fleet_ownership(&id, parse_ownership(&ownership)?)
                .await?;
            println!("Fleet {} is now {}", fleet.id, fleet.ownership);
        }
    }
    Ok(())
}

async fn run_driver_command(service: &FleetService, cmd: DriverCommands) -> Result<()> {
    match cmd {
        DriverCommands::Add {
            name,
            phone_no,
            status,
            notes,
        } => {
            let mut driver = Driver::new(name);
            driver.phone_no = phone_no;
            driver.status = status;
            driver.notes = notes;

            let driver = service.register_driver(driver).await?;
            println!("Registered driver {}: {}", driver.id, driver.name);
        }
    }
    Ok(())
}

async fn run_customer_command(service: &FleetService, cmd: CustomerCommands) -> Result<()> {
    match cmd {
        CustomerCommands::Add {
            name,
            phone_no,
            email,
            address,
        } => {
            let mut customer = Customer::new(name);
            customer.phone_no = phone_no;
            customer.email = email;
            customer.address = address;

            let customer = service.register_customer(customer).await?;
            println!("Registered customer {}: {}", customer.id, customer.name);
        }
    }
    Ok(())
}

async fn run_supplier_command(service: &FleetService, cmd: SupplierCommands) -> Result<()> {
    match cmd {
        SupplierCommands::Add {
            company_name,
            contact_person,
            phone_no,
            email,
        } => {
            let mut supplier = Supplier::new(company_name);
            supplier.contact_person = contact_person;
            supplier.phone_no = phone_no;
            supplier.email = email;

            let supplier = service.register_supplier(supplier).await?;
            println!(
                "Registered supplier {}: {}",
                supplier.id, supplier.company_name
            );
        }
    }
    Ok(())
}

async fn run_hire_command(service: &FleetService, cmd: HireCommands) -> Result<()> {
    let hires = service.hires();

    match cmd {
        HireCommands::Create {
            fleet,
            driver,
            customer,
            supplier,
            hire_type,
            start,
            end,
            rate,
            quantity,
        } => {
            let rate_cents =
                parse_cents(&rate).context("Invalid rate format. Use '150.00' or '150'")?;
            let mut request = HireRequest::new(
                fleet,
                driver,
                customer,
                hire_type,
                parse_date(&start)?,
                rate_cents,
            )
            .with_quantity(quantity);
            if let Some(supplier_id) = supplier {
                request = request.with_supplier(supplier_id);
            }
            if let Some(end) = end {
                request = request.with_end_date(parse_date(&end)?);
            }

            let hire = hires.create_hire(request).await?;
            println!(
                "Created hire {}: {} x {} = {}",
                hire.id,
                format_cents(hire.rate_cents),
                hire.quantity,
                format_cents(hire.total_cents)
            );
        }

        HireCommands::Status { id, status, force } => {
            let status = HireStatus::from_str(&status).ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid hire status '{}'. Valid: open, completed, cancelled",
                    status
                )
            })?;
            let hire = if force {
                hires.override_status(id, status).await?
            } else {
                hires.transition_status(id, status).await?
            };
            println!("Hire {} is now {}", hire.id, hire.status);
        }

        HireCommands::List { format } => {
            let rows = hires.list_hires(&HireFilter::default()).await?;
            print_hires(&rows, format)?;
        }

        HireCommands::Search { status, format } => {
            let rows = hires.list_hires(&HireFilter { status }).await?;
            print_hires(&rows, format)?;
        }

        HireCommands::Show { id } => {
            let hire = hires.get_hire(id).await?;
            println!("Hire: {}", hire.id);
            println!("  Fleet:      {}", hire.fleet_id);
            println!("  Driver:     {}", hire.driver_id);
            println!("  Customer:   {}", hire.customer_id);
            if let Some(supplier_id) = hire.supplier_id {
                println!("  Supplier:   {}", supplier_id);
            }
            println!("  Type:       {}", hire.hire_type);
            println!("  Start:      {}", hire.start_date);
            if let Some(end_date) = hire.end_date {
                println!("  End:        {}", end_date);
            }
            println!("  Rate:       {}", format_cents(hire.rate_cents));
            println!("  Quantity:   {}", hire.quantity);
            println!("  Total:      {}", format_cents(hire.total_cents));
            println!("  Status:     {}", hire.status);
        }
    }
    Ok(())
}

async fn run_invoice_command(service: &FleetService, cmd: InvoiceCommands) -> Result<()> {
    let invoices = service.invoices();

    match cmd {
        InvoiceCommands::NextNumber => {
            println!("{}", invoices.next_invoice_number().await?);
        }

        InvoiceCommands::Create { hire_id, date } => {
            let invoice = invoices
                .create_invoice_from_hire(hire_id, parse_date(&date)?)
                .await?;
            println!(
                "Created invoice {} for hire {}: {}",
                invoice.invoice_no,
                invoice.hire_id,
                format_cents(invoice.amount_cents)
            );
        }

        InvoiceCommands::Status { id, status, force } => {
            let status = PaymentStatus::from_str(&status).ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid payment status '{}'. Valid: unpaid, partially-paid, paid",
                    status
                )
            })?;
            let invoice = if force {
                invoices.override_payment_status(id, status).await?
            } else {
                invoices.update_payment_status(id, status).await?
            };
            println!(
                "Invoice {} is now {}",
                invoice.invoice_no, invoice.payment_status
            );
        }

        InvoiceCommands::List { format } => {
            let rows = invoices.list_invoices(&InvoiceFilter::default()).await?;
            print_invoices(&rows, format)?;
        }

        InvoiceCommands::Search {
            status,
            customer,
            format,
        } => {
            let filter = InvoiceFilter {
                payment_status: status,
                customer_name: customer,
            };
            let rows = invoices.list_invoices(&filter).await?;
            print_invoices(&rows, format)?;
        }
    }
    Ok(())
}

async fn run_payment_command(service: &FleetService, cmd: PaymentCommands) -> Result<()> {
    let settlements = service.settlements();

    match cmd {
        PaymentCommands::Record {
            hire_id,
            date,
            amount,
        } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '300.00' or '300'")?;
            let payment = settlements
                .record_payment(hire_id, parse_date(&date)?, amount_cents)
                .await?;
            println!(
                "Recorded payment {} to supplier {} for hire {}: {}",
                payment.id,
                payment.supplier_id,
                payment.hire_id,
                format_cents(payment.amount_cents)
            );
        }

        PaymentCommands::Status { id, status, force } => {
            let status = SettlementStatus::from_str(&status).ok_or_else(|| {
                anyhow::anyhow!("Invalid payment status '{}'. Valid: pending, paid", status)
            })?;
            let payment = if force {
                settlements.override_payment_status(id, status).await?
            } else {
                settlements.update_payment_status(id, status).await?
            };
            println!("Payment {} is now {}", payment.id, payment.status);
        }

        PaymentCommands::List { format } => {
            let rows = settlements.list_payments(&PaymentFilter::default()).await?;
            print_payments(&rows, format)?;
        }

        PaymentCommands::Search {
            supplier,
            status,
            format,
        } => {
            let filter = PaymentFilter {
                supplier_name: supplier,
                status,
            };
            let rows = settlements.list_payments(&filter).await?;
            print_payments(&rows, format)?;
        }
    }
    Ok(())
}

async fn run_check_command(service: &FleetService) -> Result<()> {
    println!("Checking fleet records...\n");

    let report = service.check_integrity().await?;

    println!("Hires:             {}", report.hire_count);
    println!("Invoices:          {}", report.invoice_count);
    println!("Supplier payments: {}", report.payment_count);
    println!();

    if report.is_healthy() {
        println!("Records are consistent.");
    } else {
        println!("Issues found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("Integrity check failed");
    }

    Ok(())
}

// ========================
// Output
// ========================

fn print_hires(rows: &[HireSummary], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(io::stdout());
            writer.write_record([
                "id",
                "fleet_id",
                "customer",
                "hire_type",
                "start_date",
                "end_date",
                "rate",
                "quantity",
                "total",
                "status",
            ])?;
            for row in rows {
                let hire = &row.hire;
                writer.write_record([
                    hire.id.to_string(),
                    hire.fleet_id.clone(),
                    row.customer_name.clone(),
                    hire.hire_type.to_string(),
                    hire.start_date.to_string(),
                    hire.end_date.map(|d| d.to_string()).unwrap_or_default(),
                    format_cents(hire.rate_cents),
                    hire.quantity.to_string(),
                    format_cents(hire.total_cents),
                    hire.status.to_string(),
                ])?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No hires found.");
                return Ok(());
            }
            println!(
                "{:<6} {:<10} {:<20} {:<8} {:<11} {:>12} {:<10}",
                "ID", "FLEET", "CUSTOMER", "TYPE", "START", "TOTAL", "STATUS"
            );
            println!("{}", "-".repeat(83));
            for row in rows {
                let hire = &row.hire;
                println!(
                    "{:<6} {:<10} {:<20} {:<8} {:<11} {:>12} {:<10}",
                    hire.id,
                    hire.fleet_id,
                    truncate(&row.customer_name, 20),
                    hire.hire_type,
                    hire.start_date,
                    format_cents(hire.total_cents),
                    hire.status
                );
            }
        }
    }
    Ok(())
}

fn print_invoices(rows: &[InvoiceSummary], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(io::stdout());
            writer.write_record([
                "id",
                "invoice_no",
                "hire_id",
                "customer",
                "invoice_date",
                "amount",
                "payment_status",
            ])?;
            for row in rows {
                let invoice = &row.invoice;
                writer.write_record([
                    invoice.id.to_string(),
                    invoice.invoice_no.clone(),
                    invoice.hire_id.to_string(),
                    row.customer_name.clone(),
                    invoice.invoice_date.to_string(),
                    format_cents(invoice.amount_cents),
                    invoice.payment_status.to_string(),
                ])?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No invoices found.");
                return Ok(());
            }
            println!(
                "{:<10} {:<6} {:<20} {:<11} {:>12} {:<15}",
                "INVOICE", "HIRE", "CUSTOMER", "DATE", "AMOUNT", "STATUS"
            );
            println!("{}", "-".repeat(79));
            for row in rows {
                let invoice = &row.invoice;
                println!(
                    "{:<10} {:<6} {:<20} {:<11} {:>12} {:<15}",
                    invoice.invoice_no,
                    invoice.hire_id,
                    truncate(&row.customer_name, 20),
                    invoice.invoice_date,
                    format_cents(invoice.amount_cents),
                    invoice.payment_status
                );
            }
        }
    }
    Ok(())
}

fn print_payments(rows: &[PaymentSummary], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(io::stdout());
            writer.write_record([
                "id",
                "supplier_id",
                "supplier",
                "hire_id",
                "payment_date",
                "amount",
                "status",
            ])?;
            for row in rows {
                let payment = &row.payment;
                writer.write_record([
                    payment.id.to_string(),
                    payment.supplier_id.to_string(),
                    row.supplier_name.clone(),
                    payment.hire_id.to_string(),
                    payment.payment_date.to_string(),
                    format_cents(payment.amount_cents),
                    payment.status.to_string(),
                ])?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No supplier payments found.");
                return Ok(());
            }
            println!(
                "{:<6} {:<24} {:<6} {:<11} {:>12} {:<8}",
                "ID", "SUPPLIER", "HIRE", "DATE", "AMOUNT", "STATUS"
            );
            println!("{}", "-".repeat(72));
            for row in rows {
                let payment = &row.payment;
                println!(
                    "{:<6} {:<24} {:<6} {:<11} {:>12} {:<8}",
                    payment.id,
                    truncate(&row.supplier_name, 24),
                    payment.hire_id,
                    payment.payment_date,
                    format_cents(payment.amount_cents),
                    payment.status
                );
            }
        }
    }
    Ok(())
}

// ========================
// Parsing helpers
// ========================

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", date_str))
}

fn parse_ownership(value: &str) -> Result<Ownership> {
    Ownership::from_str(value).ok_or_else(|| {
        anyhow::anyhow!("Invalid ownership '{}'. Valid: owned, rented-in", value)
    })
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
