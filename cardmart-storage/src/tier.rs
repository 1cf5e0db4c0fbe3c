//! Database credential tiers
//!
//! Every tier is a separate database user. The privilege sets below are what
//! the database itself enforces for that user; the application never widens
//! them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SQL privilege classes granted to a tier credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Privilege {
    Select,
    Insert,
    Update,
    Delete,
    /// CREATE / ALTER / DROP / TRUNCATE
    Ddl,
}

impl Privilege {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Privilege::Select => "SELECT",
            Privilege::Insert => "INSERT",
            Privilege::Update => "UPDATE",
            Privilege::Delete => "DELETE",
            Privilege::Ddl => "ALL PRIVILEGES",
        }
    }
}

/// Privileges held by one tier credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivilegeSet {
    privileges: &'static [Privilege],
    /// UPDATE is limited to the column allow-list in [`crate::grants`]
    restricted_update: bool,
}

impl PrivilegeSet {
    pub const fn new(privileges: &'static [Privilege], restricted_update: bool) -> Self {
        Self {
            privileges,
            restricted_update,
        }
    }

    pub fn allows(&self, privilege: Privilege) -> bool {
        self.privileges.contains(&Privilege::Ddl) || self.privileges.contains(&privilege)
    }

    pub fn privileges(&self) -> &'static [Privilege] {
        self.privileges
    }

    pub fn has_restricted_update(&self) -> bool {
        self.restricted_update
    }

    /// Whether every privilege of `other` is also held here
    pub fn includes(&self, other: &PrivilegeSet) -> bool {
        other.privileges.iter().all(|p| self.allows(*p))
            && (!self.restricted_update || other.restricted_update || !other.allows(Privilege::Update))
    }
}

const READ_PRIVILEGES: PrivilegeSet = PrivilegeSet::new(&[Privilege::Select], false);
const DATA_ENTRY_PRIVILEGES: PrivilegeSet =
    PrivilegeSet::new(&[Privilege::Select, Privilege::Insert, Privilege::Update], true);
const ADMIN_OPS_PRIVILEGES: PrivilegeSet =
    PrivilegeSet::new(&[Privilege::Select, Privilege::Insert, Privilege::Update], false);
const SYSTEM_ADMIN_PRIVILEGES: PrivilegeSet = PrivilegeSet::new(
    &[
        Privilege::Select,
        Privilege::Insert,
        Privilege::Update,
        Privilege::Delete,
        Privilege::Ddl,
    ],
    false,
);

/// Identifies which credential a data-access handle is bound to.
///
/// `Default` is the application's primary connection; the other four are the
/// operation tiers, in increasing order of privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionTier {
    Default,
    Read,
    DataEntry,
    AdminOps,
    SystemAdmin,
}

impl ConnectionTier {
    /// The four operation tiers, least privileged first
    pub const OPERATION_TIERS: [ConnectionTier; 4] = [
        ConnectionTier::Read,
        ConnectionTier::DataEntry,
        ConnectionTier::AdminOps,
        ConnectionTier::SystemAdmin,
    ];

    /// Key used in configuration files and environment variables
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionTier::Default => "default",
            ConnectionTier::Read => "read",
            ConnectionTier::DataEntry => "data_entry",
            ConnectionTier::AdminOps => "admin_ops",
            ConnectionTier::SystemAdmin => "system_admin",
        }
    }

    /// Database user provisioned for the tier
    pub fn database_role(&self) -> &'static str {
        match self {
            ConnectionTier::Default => "cardmart_app",
            ConnectionTier::Read => "cardmart_read",
            ConnectionTier::DataEntry => "cardmart_data_entry",
            ConnectionTier::AdminOps => "cardmart_admin_ops",
            ConnectionTier::SystemAdmin => "cardmart_system_admin",
        }
    }

    /// Privileges the tier credential holds. `None` for the default
    /// connection, whose grants are owned by whoever deployed the database.
    pub fn privileges(&self) -> Option<PrivilegeSet> {
        match self {
            ConnectionTier::Default => None,
            ConnectionTier::Read => Some(READ_PRIVILEGES),
            ConnectionTier::DataEntry => Some(DATA_ENTRY_PRIVILEGES),
            ConnectionTier::AdminOps => Some(ADMIN_OPS_PRIVILEGES),
            ConnectionTier::SystemAdmin => Some(SYSTEM_ADMIN_PRIVILEGES),
        }
    }
}

impl fmt::Display for ConnectionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(ConnectionTier::Default),
            "read" => Ok(ConnectionTier::Read),
            "data_entry" => Ok(ConnectionTier::DataEntry),
            "admin_ops" => Ok(ConnectionTier::AdminOps),
            "system_admin" => Ok(ConnectionTier::SystemAdmin),
            _ => Err(format!("Unknown connection tier: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privileges_strictly_widen() {
        let tiers = ConnectionTier::OPERATION_TIERS;
        for pair in tiers.windows(2) {
            let lower = pair[0].privileges().unwrap();
            let higher = pair[1].privileges().unwrap();
            assert!(higher.includes(&lower), "{} should include {}", pair[1], pair[0]);
            assert!(!lower.includes(&higher), "{} should not include {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_delete_only_at_system_admin() {
        for tier in ConnectionTier::OPERATION_TIERS {
            let allows_delete = tier.privileges().unwrap().allows(Privilege::Delete);
            assert_eq!(allows_delete, tier == ConnectionTier::SystemAdmin);
        }
    }

    #[test]
    fn test_read_is_select_only() {
        let read = ConnectionTier::Read.privileges().unwrap();
        assert!(read.allows(Privilege::Select));
        assert!(!read.allows(Privilege::Insert));
        assert!(!read.allows(Privilege::Update));
        assert!(ConnectionTier::DataEntry.privileges().unwrap().has_restricted_update());
        assert!(!ConnectionTier::AdminOps.privileges().unwrap().has_restricted_update());
    }

    #[test]
    fn test_tier_keys_round_trip() {
        for tier in ConnectionTier::OPERATION_TIERS {
            assert_eq!(tier.as_str().parse::<ConnectionTier>().unwrap(), tier);
        }
        assert!("root".parse::<ConnectionTier>().is_err());
    }
}
