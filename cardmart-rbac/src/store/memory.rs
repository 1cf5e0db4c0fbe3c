use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::{ensure_admin_survives, ensure_not_self, RoleStore};
use crate::audit;
use crate::error::{RbacError, RbacResult};
use crate::roles::{Role, RoleSet};

#[derive(Debug, Clone)]
struct UserRecord {
    email: String,
    roles: RoleSet,
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<i32, UserRecord>,
    next_id: i32,
}

impl State {
    fn user(&self, user_id: i32) -> RbacResult<&UserRecord> {
        self.users.get(&user_id).ok_or(RbacError::UserNotFound { user_id })
    }

    fn user_mut(&mut self, user_id: i32) -> RbacResult<&mut UserRecord> {
        self.users.get_mut(&user_id).ok_or(RbacError::UserNotFound { user_id })
    }

    fn admin_count(&self) -> u64 {
        self.users.values().filter(|u| u.roles.has(Role::Admin)).count() as u64
    }
}

/// Role store held in process memory.
///
/// Each operation runs under a single write lock, so the invariant check and
/// the mutation are one atomic step. Password hashes are accepted for
/// parity with the database store but not kept.
#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    state: RwLock<State>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn roles_of(&self, user_id: i32) -> RbacResult<RoleSet> {
        let state = self.state.read().await;
        Ok(state.user(user_id)?.roles.clone())
    }

    async fn assign_role(&self, user_id: i32, role_name: &str) -> RbacResult<()> {
        let role: Role = role_name.parse()?;
        let mut state = self.state.write().await;
        if state.user_mut(user_id)?.roles.insert(role) {
            audit::role_assigned(user_id, role);
        } else {
            debug!(user_id, role = %role, "Role already held");
        }
        Ok(())
    }

    async fn detach_role(&self, user_id: i32, role_name: &str) -> RbacResult<()> {
        let role: Role = role_name.parse()?;
        let mut state = self.state.write().await;
        let admin_count = state.admin_count();
        let held = state.user(user_id)?.roles.clone();

        ensure_admin_survives("detach_role", user_id, &held, role != Role::Admin, admin_count)?;

        if state.user_mut(user_id)?.roles.remove(role) {
            audit::role_detached(user_id, role);
        }
        Ok(())
    }

    async fn sync_roles(&self, user_id: i32, role_names: &[&str]) -> RbacResult<()> {
        let roles = RoleSet::parse(role_names)?;
        let mut state = self.state.write().await;
        let admin_count = state.admin_count();
        let held = state.user(user_id)?.roles.clone();

        ensure_admin_survives("sync_roles", user_id, &held, roles.has(Role::Admin), admin_count)?;

        audit::roles_synced(user_id, &roles);
        state.user_mut(user_id)?.roles = roles;
        Ok(())
    }

    async fn create_user_with_roles(
        &self,
        email: &str,
        _password_hash: &str,
        role_names: &[&str],
    ) -> RbacResult<i32> {
        let roles = RoleSet::parse(role_names)?;
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.email == email) {
            return Err(RbacError::internal(format!("Email already registered: {}", email)));
        }

        state.next_id += 1;
        let user_id = state.next_id;
        audit::user_created(user_id, &roles);
        state.users.insert(
            user_id,
            UserRecord {
                email: email.to_string(),
                roles,
            },
        );
        Ok(user_id)
    }

    async fn delete_user(&self, actor_id: i32, target_id: i32) -> RbacResult<()> {
        ensure_not_self(actor_id, target_id)?;

        let mut state = self.state.write().await;
        let admin_count = state.admin_count();
        let held = state.user(target_id)?.roles.clone();

        ensure_admin_survives("delete_user", target_id, &held, false, admin_count)?;

        state.users.remove(&target_id);
        audit::user_deleted(actor_id, target_id);
        Ok(())
    }

    async fn admin_count(&self) -> RbacResult<u64> {
        Ok(self.state.read().await.admin_count())
    }
}
