//! Domain-driven configuration for cardmart
//!
//! Configuration is split by functional domain (database credential tiers,
//! authorization, logging). Every domain validates itself and can be
//! overridden from `CARDMART_*` environment variables.

pub mod domains;
pub mod error;
pub mod loader;
pub mod validation;

pub use domains::{
    authorization::AuthorizationConfig,
    database::{DatabaseConfig, TierCredential, TierCredentials},
    logging::{LogFormat, LogLevel, LoggingConfig},
    CardmartConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;
