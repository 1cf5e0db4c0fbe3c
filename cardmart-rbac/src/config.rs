//! Minimum role per operation tier

use cardmart_config::AuthorizationConfig;
use cardmart_storage::ConnectionTier;
use std::collections::HashMap;

use crate::error::{RbacError, RbacResult};
use crate::roles::Role;

/// Static table of the least-privileged role allowed to run work at each
/// operation tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPolicy {
    minimums: HashMap<ConnectionTier, Role>,
}

impl Default for TierPolicy {
    fn default() -> Self {
        let minimums = ConnectionTier::OPERATION_TIERS
            .into_iter()
            .filter_map(|tier| default_minimum(tier).map(|role| (tier, role)))
            .collect();
        Self { minimums }
    }
}

impl TierPolicy {
    /// Built-in table with the overrides from configuration applied
    pub fn from_config(config: &AuthorizationConfig) -> RbacResult<Self> {
        let mut policy = Self::default();
        for (tier_key, role_name) in &config.tier_minimum_roles {
            let tier: ConnectionTier = tier_key.parse().map_err(RbacError::internal)?;
            if tier == ConnectionTier::Default {
                return Err(RbacError::internal("The default connection has no minimum role"));
            }
            let role: Role = role_name.parse()?;
            policy.minimums.insert(tier, role);
        }
        Ok(policy)
    }

    pub fn with_minimum(mut self, tier: ConnectionTier, role: Role) -> Self {
        if tier != ConnectionTier::Default {
            self.minimums.insert(tier, role);
        }
        self
    }

    /// Minimum role for `tier`; `None` for the default connection, which is
    /// not an operation tier
    pub fn minimum_role(&self, tier: ConnectionTier) -> Option<Role> {
        self.minimums.get(&tier).copied()
    }
}

fn default_minimum(tier: ConnectionTier) -> Option<Role> {
    match tier {
        ConnectionTier::Default => None,
        ConnectionTier::Read => Some(Role::Customer),
        ConnectionTier::DataEntry => Some(Role::Employee),
        ConnectionTier::AdminOps => Some(Role::Admin),
        ConnectionTier::SystemAdmin => Some(Role::Admin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_default_minimums() {
        let policy = TierPolicy::default();
        assert_eq!(policy.minimum_role(ConnectionTier::Read), Some(Role::Customer));
        assert_eq!(policy.minimum_role(ConnectionTier::DataEntry), Some(Role::Employee));
        assert_eq!(policy.minimum_role(ConnectionTier::AdminOps), Some(Role::Admin));
        assert_eq!(policy.minimum_role(ConnectionTier::SystemAdmin), Some(Role::Admin));
        assert_eq!(policy.minimum_role(ConnectionTier::Default), None);
    }

    #[test]
    fn test_config_overrides() {
        let config = AuthorizationConfig {
            tier_minimum_roles: BTreeMap::from([("data_entry".to_string(), "Admin".to_string())]),
            ..Default::default()
        };
        let policy = TierPolicy::from_config(&config).unwrap();
        assert_eq!(policy.minimum_role(ConnectionTier::DataEntry), Some(Role::Admin));
        assert_eq!(policy.minimum_role(ConnectionTier::Read), Some(Role::Customer));
    }

    #[test]
    fn test_bad_overrides_rejected() {
        let config = AuthorizationConfig {
            tier_minimum_roles: BTreeMap::from([("read".to_string(), "Guest".to_string())]),
            ..Default::default()
        };
        assert!(matches!(
            TierPolicy::from_config(&config),
            Err(RbacError::UnknownRole { .. })
        ));

        let config = AuthorizationConfig {
            tier_minimum_roles: BTreeMap::from([("default".to_string(), "Admin".to_string())]),
            ..Default::default()
        };
        assert!(TierPolicy::from_config(&config).is_err());
    }
}
