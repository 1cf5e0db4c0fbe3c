//! Authorization configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ConfigResult;
use crate::validation::{validate_enum_choice, validate_required_string, Validatable};

const ROLE_NAMES: [&str; 3] = ["Admin", "Employee", "Customer"];
const TIER_KEYS: [&str; 4] = ["read", "data_entry", "admin_ops", "system_admin"];

/// Authorization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// Let the Admin role short-circuit every policy decision. Off unless
    /// explicitly enabled; every use is written to the audit log.
    #[serde(default)]
    pub admin_bypass: bool,

    /// Where browser clients are redirected when unauthenticated
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Require customers to own an order to view it
    #[serde(default = "super::utils::default_true")]
    pub enforce_order_ownership: bool,

    /// Minimum role per operation tier, keyed by tier (`read`, `data_entry`,
    /// `admin_ops`, `system_admin`). Unlisted tiers use the built-in table.
    #[serde(default)]
    pub tier_minimum_roles: BTreeMap<String, String>,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            admin_bypass: false,
            login_path: default_login_path(),
            enforce_order_ownership: true,
            tier_minimum_roles: BTreeMap::new(),
        }
    }
}

impl Validatable for AuthorizationConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.login_path, "login_path", self.domain_name())?;
        if !self.login_path.starts_with('/') {
            return Err(self.validation_error("login_path must be an absolute path"));
        }

        for (tier, role) in &self.tier_minimum_roles {
            validate_enum_choice(tier, &TIER_KEYS, "tier_minimum_roles key", self.domain_name())?;
            validate_enum_choice(role, &ROLE_NAMES, "tier_minimum_roles value", self.domain_name())?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "authorization"
    }
}

fn default_login_path() -> String {
    "/login".to_string()
}
