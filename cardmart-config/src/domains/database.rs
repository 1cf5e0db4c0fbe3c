//! Database configuration: the default connection plus one credential per
//! operation tier.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{validate_database_url, validate_positive, Validatable};

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// URL of the default (application) connection
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections in each tier's pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection and acquire timeout
    #[serde(with = "super::utils::serde_duration", default = "default_connection_timeout")]
    pub connection_timeout: Duration,

    /// Whether sqlx statement logging is enabled
    #[serde(default)]
    pub sqlx_logging: bool,

    /// Per-tier credentials
    #[serde(default)]
    pub tiers: TierCredentials,
}

/// One credential per operation tier. A missing entry means the tier is
/// served by the default connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TierCredentials {
    pub read: Option<TierCredential>,
    pub data_entry: Option<TierCredential>,
    pub admin_ops: Option<TierCredential>,
    pub system_admin: Option<TierCredential>,
}

/// Connection details for a single tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierCredential {
    /// Connection URL, including the tier's database user
    pub url: String,

    /// Optional pool size override
    #[serde(default)]
    pub max_connections: Option<u32>,
}

impl TierCredential {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: None,
        }
    }
}

impl TierCredentials {
    /// Iterate over configured tiers as `(key, credential)` pairs
    pub fn configured(&self) -> impl Iterator<Item = (&'static str, &TierCredential)> {
        [
            ("read", self.read.as_ref()),
            ("data_entry", self.data_entry.as_ref()),
            ("admin_ops", self.admin_ops.as_ref()),
            ("system_admin", self.system_admin.as_ref()),
        ]
        .into_iter()
        .filter_map(|(key, credential)| credential.map(|c| (key, c)))
    }

    /// Mutable access by tier key, used by environment overrides
    pub fn slot_mut(&mut self, key: &str) -> Option<&mut Option<TierCredential>> {
        match key {
            "read" => Some(&mut self.read),
            "data_entry" => Some(&mut self.data_entry),
            "admin_ops" => Some(&mut self.admin_ops),
            "system_admin" => Some(&mut self.system_admin),
            _ => None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connection_timeout: default_connection_timeout(),
            sqlx_logging: false,
            tiers: TierCredentials::default(),
        }
    }
}

impl Validatable for DatabaseConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_database_url(&self.url, "url", self.domain_name())?;
        validate_positive(self.max_connections, "max_connections", self.domain_name())?;

        if self.connection_timeout.is_zero() {
            return Err(self.validation_error("connection_timeout must be greater than 0"));
        }

        for (key, credential) in self.tiers.configured() {
            validate_database_url(&credential.url, &format!("tiers.{}.url", key), self.domain_name())?;
            if let Some(max) = credential.max_connections {
                validate_positive(max, &format!("tiers.{}.max_connections", key), self.domain_name())?;
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "database"
    }
}

fn default_database_url() -> String {
    "sqlite://cardmart.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_connection_timeout() -> Duration {
    Duration::from_secs(30)
}
