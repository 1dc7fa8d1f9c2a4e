use std::path::PathBuf;
use std::time::Duration;

/// Default database file, relative to the working directory.
pub const DEFAULT_DATABASE: &str = "fleet.db";

/// Environment variable holding the tracing filter for the binary.
pub const LOG_ENV: &str = "FLEETDESK_LOG";

/// Storage and sequencing settings.
///
/// ```rust,ignore
/// let config = StoreConfig::new("fleet.db").max_connections(8);
/// let service = FleetService::init(config).await?;
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the SQLite database file (created on init).
    pub database_path: PathBuf,

    /// Maximum number of pooled connections. Default: 5
    pub max_connections: u32,

    /// Connections kept open while idle. Default: 1
    pub min_connections: u32,

    /// How long a write waits for the database lock before failing.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// How long to wait for a pooled connection. Default: 30 seconds
    pub acquire_timeout: Duration,

    /// Attempts at allocating an invoice number when another writer
    /// took the same number first. Default: 3
    pub invoice_attempts: u32,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(30),
            invoice_attempts: 3,
        }
    }

    /// A private in-memory database. Limited to one connection, since every
    /// connection to `:memory:` opens a separate database.
    pub fn in_memory() -> Self {
        StoreConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(5),
            invoice_attempts: 3,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn invoice_attempts(mut self, attempts: u32) -> Self {
        self.invoice_attempts = attempts.max(1);
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE)
    }
}
