use serde::{Deserialize, Serialize};

pub type FleetId = String;
pub type DriverId = i64;
pub type CustomerId = i64;
pub type SupplierId = i64;

/// Whether an asset belongs to the company or is rented in from a supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ownership {
    Owned,
    #[serde(rename = "Rented-in")]
    RentedIn,
}

impl Ownership {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ownership::Owned => "Owned",
            Ownership::RentedIn => "Rented-in",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "owned" => Some(Ownership::Owned),
            "rented-in" | "rentedin" => Some(Ownership::RentedIn),
            _ => None,
        }
    }

    /// Rented-in assets are always billed back to a supplier.
    pub fn requires_supplier(&self) -> bool {
        matches!(self, Ownership::RentedIn)
    }
}

impl std::fmt::Display for Ownership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fleet {
    pub id: FleetId,
    pub serial_no: Option<String>,
    pub fleet_type: Option<String>,
    pub ownership: Ownership,
    pub capacity: Option<f64>,
    pub status: Option<String>,
}

impl Fleet {
    pub fn new(id: impl Into<FleetId>, ownership: Ownership) -> Self {
        Self {
            id: id.into(),
            serial_no: None,
            fleet_type: None,
            ownership,
            capacity: None,
            status: None,
        }
    }

    pub fn with_serial_no(mut self, serial_no: impl Into<String>) -> Self {
        self.serial_no = Some(serial_no.into());
        self
    }

    pub fn with_fleet_type(mut self, fleet_type: impl Into<String>) -> Self {
        self.fleet_type = Some(fleet_type.into());
        self
    }

    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    pub phone_no: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

impl Driver {
    /// Create a new driver. The identifier is assigned by the repository.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            phone_no: None,
            status: None,
            notes: None,
        }
    }

    pub fn with_phone_no(mut self, phone_no: impl Into<String>) -> Self {
        self.phone_no = Some(phone_no.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone_no: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl Customer {
    /// Create a new customer. The identifier is assigned by the repository.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            phone_no: None,
            email: None,
            address: None,
        }
    }

    pub fn with_phone_no(mut self, phone_no: impl Into<String>) -> Self {
        self.phone_no = Some(phone_no.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub company_name: String,
    pub contact_person: Option<String>,
    pub phone_no: Option<String>,
    pub email: Option<String>,
}

impl Supplier {
    /// Create a new supplier. The identifier is assigned by the repository.
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            id: 0,
            company_name: company_name.into(),
            contact_person: None,
            phone_no: None,
            email: None,
        }
    }

    pub fn with_contact_person(mut self, contact_person: impl Into<String>) -> Self {
        self.contact_person = Some(contact_person.into());
        self
    }

    pub fn with_phone_no(mut self, phone_no: impl Into<String>) -> Self {
        self.phone_no = Some(phone_no.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Primary key of a master record. The variant picks the table, so lookups
/// never take a caller-supplied table or column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKey<'a> {
    Fleet(&'a str),
    Driver(DriverId),
    Customer(CustomerId),
    Supplier(SupplierId),
}

impl ReferenceKey<'_> {
    pub fn entity(&self) -> super::Entity {
        match self {
            ReferenceKey::Fleet(_) => super::Entity::Fleet,
            ReferenceKey::Driver(_) => super::Entity::Driver,
            ReferenceKey::Customer(_) => super::Entity::Customer,
            ReferenceKey::Supplier(_) => super::Entity::Supplier,
        }
    }
}

impl std::fmt::Display for ReferenceKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceKey::Fleet(id) => write!(f, "{}", id),
            ReferenceKey::Driver(id) | ReferenceKey::Customer(id) | ReferenceKey::Supplier(id) => {
                write!(f, "{}", id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ownership_labels() {
        assert_eq!(Ownership::RentedIn.as_str(), "Rented-in");
        assert_eq!(Ownership::from_str("Rented-in"), Some(Ownership::RentedIn));
        assert_eq!(Ownership::from_str("rented in"), Some(Ownership::RentedIn));
        assert_eq!(Ownership::from_str("OWNED"), Some(Ownership::Owned));
        assert_eq!(Ownership::from_str("leased"), None);
    }

    #[test]
    fn test_only_rented_in_requires_supplier() {
        assert!(Ownership::RentedIn.requires_supplier());
        assert!(!Ownership::Owned.requires_supplier());
    }

    #[test]
    fn test_reference_key_entity() {
        assert_eq!(ReferenceKey::Fleet("F1").entity(), super::super::Entity::Fleet);
        assert_eq!(ReferenceKey::Supplier(3).to_string(), "3");
    }
}
