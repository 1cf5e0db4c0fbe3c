//! Configuration loading and environment variable handling

use std::path::Path;
use std::str::FromStr;

use crate::domains::{
    database::{DatabaseConfig, TierCredential},
    logging::{LogFormat, LogLevel, LoggingConfig},
    authorization::AuthorizationConfig,
    CardmartConfig,
};
use crate::error::{ConfigError, ConfigResult};

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "CARDMART".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<CardmartConfig> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: CardmartConfig = serde_yaml::from_str(&content)?;
        tracing::debug!("Loaded configuration from {}", path.as_ref().display());

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<CardmartConfig> {
        let mut config = CardmartConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<CardmartConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn apply_env_overrides(&self, config: &mut CardmartConfig) -> ConfigResult<()> {
        self.apply_database_overrides(&mut config.database)?;
        self.apply_authorization_overrides(&mut config.authorization)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    fn apply_database_overrides(&self, config: &mut DatabaseConfig) -> ConfigResult<()> {
        if let Ok(url) = self.get_env_var("DATABASE_URL") {
            config.url = url;
        }

        if let Ok(max) = self.get_env_var("DATABASE_MAX_CONNECTIONS") {
            config.max_connections = max.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid DATABASE_MAX_CONNECTIONS: {}", e))
            })?;
        }

        for key in ["read", "data_entry", "admin_ops", "system_admin"] {
            let var = format!("DATABASE_{}_URL", key.to_uppercase());
            if let Ok(url) = self.get_env_var(&var) {
                if let Some(slot) = config.tiers.slot_mut(key) {
                    match slot {
                        Some(credential) => credential.url = url,
                        None => *slot = Some(TierCredential::new(url)),
                    }
                }
            }
        }

        Ok(())
    }

    fn apply_authorization_overrides(&self, config: &mut AuthorizationConfig) -> ConfigResult<()> {
        if let Ok(bypass) = self.get_env_var("ADMIN_BYPASS") {
            config.admin_bypass = bypass
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid ADMIN_BYPASS: {}", e)))?;
        }

        if let Ok(path) = self.get_env_var("LOGIN_PATH") {
            config.login_path = path;
        }

        Ok(())
    }

    fn apply_logging_overrides(&self, config: &mut LoggingConfig) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
