//! Authenticated caller context

use serde::{Deserialize, Serialize};

use crate::roles::{Role, RoleSet};

/// The authenticated user attached to a request.
///
/// The identity layer inserts this into request extensions; its absence
/// means the request is anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: i32,
    pub email: Option<String>,
    pub roles: RoleSet,
}

impl AuthContext {
    /// Create a context with no roles
    pub fn new(user_id: i32) -> Self {
        Self {
            user_id,
            email: None,
            roles: RoleSet::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        for role in roles {
            self.roles.insert(role);
        }
        self
    }

    /// Exact, case-sensitive role name check
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.has_named(name)
    }

    pub fn is(&self, role: Role) -> bool {
        self.roles.has(role)
    }

    pub fn highest_role(&self) -> Option<Role> {
        self.roles.highest()
    }
}

/// Highest role of an optional caller; `None` when anonymous or role-less
pub fn highest_role_of(ctx: Option<&AuthContext>) -> Option<Role> {
    ctx.and_then(AuthContext::highest_role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let ctx = AuthContext::new(7)
            .with_email("staff@cardmart.test")
            .with_roles([Role::Employee, Role::Customer]);

        assert_eq!(ctx.user_id, 7);
        assert!(ctx.has_role("Employee"));
        assert!(!ctx.has_role("Admin"));
        assert_eq!(ctx.highest_role(), Some(Role::Employee));
    }

    #[test]
    fn test_anonymous_has_no_role() {
        assert_eq!(highest_role_of(None), None);
        assert_eq!(highest_role_of(Some(&AuthContext::new(1))), None);
    }
}
