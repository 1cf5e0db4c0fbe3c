//! The fixed role set and its privilege ordering

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::RbacError;

/// Marketplace roles.
///
/// Variants are declared in increasing order of privilege so the derived
/// `Ord` gives `Customer < Employee < Admin`. An unauthenticated caller is
/// modelled as `Option::<Role>::None`, which sorts below every role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Customer,
    Employee,
    Admin,
}

impl Role {
    /// Every role, least privileged first
    pub const ALL: [Role; 3] = [Role::Customer, Role::Employee, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::Employee => "Employee",
            Role::Admin => "Admin",
        }
    }

    /// Whether `self` is at least as privileged as `minimum`
    pub fn satisfies(&self, minimum: Role) -> bool {
        *self >= minimum
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role names are exact, case-sensitive matches
impl FromStr for Role {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Customer" => Ok(Role::Customer),
            "Employee" => Ok(Role::Employee),
            "Admin" => Ok(Role::Admin),
            other => Err(RbacError::unknown_role(other)),
        }
    }
}

/// An order-insensitive set of roles held by one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a list of role names, rejecting the first unknown one
    pub fn parse<I, S>(names: I) -> Result<Self, RbacError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| name.as_ref().parse::<Role>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    pub fn has(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Name-based membership check. Unknown names are simply not held.
    pub fn has_named(&self, name: &str) -> bool {
        name.parse::<Role>().map(|role| self.has(role)).unwrap_or(false)
    }

    pub fn has_any(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has(*role))
    }

    /// Highest-privilege role held, `None` for an empty set
    pub fn highest(&self) -> Option<Role> {
        self.0.iter().next_back().copied()
    }

    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn remove(&mut self, role: Role) -> bool {
        self.0.remove(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    pub fn names(&self) -> BTreeSet<&'static str> {
        self.0.iter().map(Role::as_str).collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Role; N]> for RoleSet {
    fn from(roles: [Role; N]) -> Self {
        roles.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardmart_storage::SEEDED_ROLE_NAMES;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin > Role::Employee);
        assert!(Role::Employee > Role::Customer);
        assert!(Some(Role::Customer) > None);
        assert!(Role::Admin.satisfies(Role::Employee));
        assert!(!Role::Customer.satisfies(Role::Employee));
    }

    #[test]
    fn test_role_names_are_case_sensitive() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        let err = "admin".parse::<Role>().unwrap_err();
        assert!(matches!(err, RbacError::UnknownRole { ref role_name } if role_name == "admin"));
        assert!("Manager".parse::<Role>().is_err());
    }

    #[test]
    fn test_seeded_names_match_role_set() {
        let mut seeded: Vec<&str> = SEEDED_ROLE_NAMES.to_vec();
        let mut known: Vec<&str> = Role::ALL.iter().map(Role::as_str).collect();
        seeded.sort();
        known.sort();
        assert_eq!(seeded, known);
    }

    #[test]
    fn test_role_set_highest() {
        assert_eq!(RoleSet::new().highest(), None);
        let set = RoleSet::from([Role::Customer, Role::Employee]);
        assert_eq!(set.highest(), Some(Role::Employee));
        assert!(set.has_named("Employee"));
        assert!(!set.has_named("employee"));
    }

    #[test]
    fn test_role_set_parse_rejects_unknown() {
        assert!(RoleSet::parse(["Admin", "Customer"]).is_ok());
        assert!(RoleSet::parse(["Admin", "Root"]).is_err());
        assert_eq!(RoleSet::parse(["Admin", "Admin"]).unwrap().len(), 1);
    }
}
