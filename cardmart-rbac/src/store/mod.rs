//! Role assignment store
//!
//! Users and roles form a many-to-many association. Every mutation that
//! could leave the system without an Admin checks the invariant before it
//! writes, inside the same unit of work as the write.

mod memory;
mod seaorm;

pub use memory::InMemoryRoleStore;
pub use seaorm::SeaOrmRoleStore;

use async_trait::async_trait;

use crate::error::{RbacError, RbacResult};
use crate::roles::{Role, RoleSet};

/// Persistence of user role memberships
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Roles currently held by the user
    async fn roles_of(&self, user_id: i32) -> RbacResult<RoleSet>;

    /// Exact, case-sensitive role name check. Unknown names are an error.
    async fn has_role(&self, user_id: i32, role_name: &str) -> RbacResult<bool> {
        let role: Role = role_name.parse()?;
        Ok(self.roles_of(user_id).await?.has(role))
    }

    /// Attach a role. Attaching a held role is a no-op.
    async fn assign_role(&self, user_id: i32, role_name: &str) -> RbacResult<()>;

    /// Detach a role. Fails when it would remove the last Admin.
    async fn detach_role(&self, user_id: i32, role_name: &str) -> RbacResult<()>;

    /// Replace the user's role set in one step
    async fn sync_roles(&self, user_id: i32, role_names: &[&str]) -> RbacResult<()>;

    /// Self-registration; the new user holds exactly `Customer`
    async fn register_user(&self, email: &str, password_hash: &str) -> RbacResult<i32> {
        self.create_user_with_roles(email, password_hash, &[Role::Customer.as_str()])
            .await
    }

    /// Admin-created user with an explicit role set
    async fn create_user_with_roles(
        &self,
        email: &str,
        password_hash: &str,
        role_names: &[&str],
    ) -> RbacResult<i32>;

    /// Delete `target_id` on behalf of `actor_id`. Users cannot delete
    /// themselves and the last Admin cannot be deleted.
    async fn delete_user(&self, actor_id: i32, target_id: i32) -> RbacResult<()>;

    /// Number of users holding `Admin`
    async fn admin_count(&self) -> RbacResult<u64>;
}

/// Reject a change that takes `Admin` away from the only user holding it
pub(crate) fn ensure_admin_survives(
    action: &str,
    user_id: i32,
    held: &RoleSet,
    keeps_admin: bool,
    admin_count: u64,
) -> RbacResult<()> {
    if held.has(Role::Admin) && !keeps_admin && admin_count <= 1 {
        let message = format!("user {} is the last Admin", user_id);
        crate::audit::invariant_rejected(action, user_id, &message);
        return Err(RbacError::invariant(message));
    }
    Ok(())
}

pub(crate) fn ensure_not_self(actor_id: i32, target_id: i32) -> RbacResult<()> {
    if actor_id == target_id {
        let message = "users cannot delete themselves".to_string();
        crate::audit::invariant_rejected("delete_user", target_id, &message);
        return Err(RbacError::invariant(message));
    }
    Ok(())
}
