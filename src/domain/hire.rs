use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{
    checked_total, Cents, CustomerId, DriverId, FleetId, Lifecycle, SupplierId, ValidationError,
};

pub type HireId = i64;

/// Billing period of a hire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HireType {
    Daily,
    Weekly,
    Monthly,
    Trip,
}

impl HireType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HireType::Daily => "Daily",
            HireType::Weekly => "Weekly",
            HireType::Monthly => "Monthly",
            HireType::Trip => "Trip",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Some(HireType::Daily),
            "weekly" => Some(HireType::Weekly),
            "monthly" => Some(HireType::Monthly),
            "trip" => Some(HireType::Trip),
            _ => None,
        }
    }
}

impl std::fmt::Display for HireType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HireStatus {
    Open,
    Completed,
    Cancelled,
}

impl HireStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HireStatus::Open => "Open",
            HireStatus::Completed => "Completed",
            HireStatus::Cancelled => "Cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "open" => Some(HireStatus::Open),
            "completed" => Some(HireStatus::Completed),
            "cancelled" | "canceled" => Some(HireStatus::Cancelled),
            _ => None,
        }
    }
}

impl Lifecycle for HireStatus {
    fn successors(self) -> &'static [Self] {
        match self {
            HireStatus::Open => &[HireStatus::Completed, HireStatus::Cancelled],
            HireStatus::Completed | HireStatus::Cancelled => &[],
        }
    }
}

impl std::fmt::Display for HireStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rental agreement. The total is fixed at creation and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hire {
    pub id: HireId,
    pub fleet_id: FleetId,
    pub driver_id: DriverId,
    pub customer_id: CustomerId,
    pub supplier_id: Option<SupplierId>,
    pub hire_type: HireType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub rate_cents: Cents,
    pub quantity: i64,
    pub total_cents: Cents,
    pub status: HireStatus,
}

/// Operator input for a new hire. The hire type arrives as text and is only
/// parsed once every reference has been checked.
#[derive(Debug, Clone)]
pub struct HireRequest {
    pub fleet_id: FleetId,
    pub driver_id: DriverId,
    pub customer_id: CustomerId,
    pub supplier_id: Option<SupplierId>,
    pub hire_type: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub rate_cents: Cents,
    pub quantity: i64,
}

impl HireRequest {
    pub fn new(
        fleet_id: impl Into<FleetId>,
        driver_id: DriverId,
        customer_id: CustomerId,
        hire_type: impl Into<String>,
        start_date: NaiveDate,
        rate_cents: Cents,
    ) -> Self {
        Self {
            fleet_id: fleet_id.into(),
            driver_id,
            customer_id,
            supplier_id: None,
            hire_type: hire_type.into(),
            start_date,
            end_date: None,
            rate_cents,
            quantity: 1,
        }
    }

    pub fn with_supplier(mut self, supplier_id: SupplierId) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    /// Check the non-reference parts of the request and compute the total.
    pub fn terms(&self) -> Result<HireTerms, ValidationError> {
        let hire_type = HireType::from_str(&self.hire_type)
            .ok_or_else(|| ValidationError::InvalidHireType(self.hire_type.clone()))?;

        if self.rate_cents <= 0 {
            return Err(ValidationError::InvalidRate(self.rate_cents));
        }
        if self.quantity < 1 {
            return Err(ValidationError::InvalidQuantity(self.quantity));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(ValidationError::EndBeforeStart {
                    start: self.start_date,
                    end,
                });
            }
        }

        let total_cents = checked_total(self.rate_cents, self.quantity).ok_or(
            ValidationError::AmountOverflow {
                rate: self.rate_cents,
                quantity: self.quantity,
            },
        )?;

        Ok(HireTerms {
            hire_type,
            start_date: self.start_date,
            end_date: self.end_date,
            rate_cents: self.rate_cents,
            quantity: self.quantity,
            total_cents,
        })
    }
}

/// Validated billing terms of a hire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HireTerms {
    pub hire_type: HireType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub rate_cents: Cents,
    pub quantity: i64,
    pub total_cents: Cents,
}

/// A fully validated hire waiting for its identifier.
#[derive(Debug, Clone)]
pub struct NewHire {
    pub fleet_id: FleetId,
    pub driver_id: DriverId,
    pub customer_id: CustomerId,
    pub supplier_id: Option<SupplierId>,
    pub terms: HireTerms,
}

impl NewHire {
    pub fn into_hire(self, id: HireId) -> Hire {
        Hire {
            id,
            fleet_id: self.fleet_id,
            driver_id: self.driver_id,
            customer_id: self.customer_id,
            supplier_id: self.supplier_id,
            hire_type: self.terms.hire_type,
            start_date: self.terms.start_date,
            end_date: self.terms.end_date,
            rate_cents: self.terms.rate_cents,
            quantity: self.terms.quantity,
            total_cents: self.terms.total_cents,
            status: HireStatus::Open,
        }
    }
}
