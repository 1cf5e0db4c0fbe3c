//! Domain-specific configuration modules

pub mod authorization;
pub mod database;
pub mod logging;
pub mod utils;

use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;
use crate::validation::Validatable;

/// Main cardmart configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CardmartConfig {
    #[serde(default)]
    pub database: database::DatabaseConfig,

    #[serde(default)]
    pub authorization: authorization::AuthorizationConfig,

    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl CardmartConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.database.validate()?;
        self.authorization.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        serde_yaml::to_string(&CardmartConfig::default())
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
