//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger engine configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Lock wait timeout applied to each unit of work, in milliseconds.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_lock_timeout_ms() -> u64 {
    5_000
}

/// Ledger engine configuration.
///
/// Voucher types are kept as strings here and parsed into the closed
/// `VoucherType` enum by the engine when it is constructed.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Prefix for generated voucher numbers.
    #[serde(default = "default_voucher_prefix")]
    pub voucher_prefix: String,
    /// Attempts made to create a voucher when its number collides.
    #[serde(default = "default_numbering_max_attempts")]
    pub numbering_max_attempts: u32,
    /// Attempts made to append an audit record before giving up.
    #[serde(default = "default_audit_max_attempts")]
    pub audit_max_attempts: u32,
    /// Voucher types that may be posted straight from draft or submitted.
    #[serde(default)]
    pub direct_post_voucher_types: Vec<String>,
}

fn default_voucher_prefix() -> String {
    "V".to_string()
}

fn default_numbering_max_attempts() -> u32 {
    3
}

fn default_audit_max_attempts() -> u32 {
    3
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            voucher_prefix: default_voucher_prefix(),
            numbering_max_attempts: default_numbering_max_attempts(),
            audit_max_attempts: default_audit_max_attempts(),
            direct_post_voucher_types: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("GIRDER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("ledger.direct_post_voucher_types")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
