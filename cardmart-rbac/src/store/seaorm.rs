use async_trait::async_trait;
use cardmart_storage::entities::{
    role_user, roles, RoleColumn, RoleUser, RoleUserActiveModel, RoleUserColumn, Roles, UserActiveModel, Users,
};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    JoinType, PaginatorTrait, QueryFilter, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use tracing::debug;

use super::{ensure_admin_survives, ensure_not_self, RoleStore};
use crate::audit;
use crate::error::{RbacError, RbacResult};
use crate::roles::{Role, RoleSet};

/// Role store backed by the `users`, `roles` and `role_user` tables.
///
/// Mutations run in a transaction; the invariant check reads inside the
/// same transaction before the first write.
#[derive(Debug, Clone)]
pub struct SeaOrmRoleStore {
    db: DatabaseConnection,
}

impl SeaOrmRoleStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

async fn ensure_user<C: ConnectionTrait>(conn: &C, user_id: i32) -> RbacResult<()> {
    match Users::find_by_id(user_id).one(conn).await? {
        Some(_) => Ok(()),
        None => Err(RbacError::UserNotFound { user_id }),
    }
}

async fn role_id<C: ConnectionTrait>(conn: &C, role: Role) -> RbacResult<i32> {
    Roles::find()
        .filter(RoleColumn::Name.eq(role.as_str()))
        .one(conn)
        .await?
        .map(|row| row.id)
        .ok_or_else(|| RbacError::internal(format!("Role {} is not seeded", role)))
}

async fn roles_of<C: ConnectionTrait>(conn: &C, user_id: i32) -> RbacResult<RoleSet> {
    let rows = Roles::find()
        .join(JoinType::InnerJoin, roles::Relation::RoleUser.def())
        .filter(RoleUserColumn::UserId.eq(user_id))
        .all(conn)
        .await?;

    RoleSet::parse(rows.iter().map(|row| row.name.as_str()))
}

async fn admin_count<C: ConnectionTrait>(conn: &C) -> RbacResult<u64> {
    let count = RoleUser::find()
        .join(JoinType::InnerJoin, role_user::Relation::Role.def())
        .filter(RoleColumn::Name.eq(Role::Admin.as_str()))
        .count(conn)
        .await?;
    Ok(count)
}

async fn attach<C: ConnectionTrait>(conn: &C, user_id: i32, role: Role) -> RbacResult<bool> {
    let role_id = role_id(conn, role).await?;
    if RoleUser::find_by_id((user_id, role_id)).one(conn).await?.is_some() {
        return Ok(false);
    }

    RoleUserActiveModel {
        user_id: Set(user_id),
        role_id: Set(role_id),
    }
    .insert(conn)
    .await?;
    Ok(true)
}

#[async_trait]
impl RoleStore for SeaOrmRoleStore {
    async fn roles_of(&self, user_id: i32) -> RbacResult<RoleSet> {
        ensure_user(&self.db, user_id).await?;
        roles_of(&self.db, user_id).await
    }

    async fn assign_role(&self, user_id: i32, role_name: &str) -> RbacResult<()> {
        let role: Role = role_name.parse()?;
        let txn = self.db.begin().await?;

        ensure_user(&txn, user_id).await?;
        let attached = attach(&txn, user_id, role).await?;
        txn.commit().await?;

        if attached {
            audit::role_assigned(user_id, role);
        } else {
            debug!(user_id, role = %role, "Role already held");
        }
        Ok(())
    }

    async fn detach_role(&self, user_id: i32, role_name: &str) -> RbacResult<()> {
        let role: Role = role_name.parse()?;
        let txn = self.db.begin().await?;

        ensure_user(&txn, user_id).await?;
        let held = roles_of(&txn, user_id).await?;
        let admins = admin_count(&txn).await?;
        ensure_admin_survives("detach_role", user_id, &held, role != Role::Admin, admins)?;

        let role_id = role_id(&txn, role).await?;
        let result = RoleUser::delete_many()
            .filter(RoleUserColumn::UserId.eq(user_id))
            .filter(RoleUserColumn::RoleId.eq(role_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        if result.rows_affected > 0 {
            audit::role_detached(user_id, role);
        }
        Ok(())
    }

    async fn sync_roles(&self, user_id: i32, role_names: &[&str]) -> RbacResult<()> {
        let roles = RoleSet::parse(role_names)?;
        let txn = self.db.begin().await?;

        ensure_user(&txn, user_id).await?;
        let held = roles_of(&txn, user_id).await?;
        let admins = admin_count(&txn).await?;
        ensure_admin_survives("sync_roles", user_id, &held, roles.has(Role::Admin), admins)?;

        RoleUser::delete_many()
            .filter(RoleUserColumn::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        for role in roles.iter() {
            attach(&txn, user_id, role).await?;
        }
        txn.commit().await?;

        audit::roles_synced(user_id, &roles);
        Ok(())
    }

    async fn create_user_with_roles(
        &self,
        email: &str,
        password_hash: &str,
        role_names: &[&str],
    ) -> RbacResult<i32> {
        let roles = RoleSet::parse(role_names)?;
        let txn = self.db.begin().await?;

        let user = UserActiveModel {
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            ..UserActiveModel::new()
        }
        .insert(&txn)
        .await?;

        for role in roles.iter() {
            attach(&txn, user.id, role).await?;
        }
        txn.commit().await?;

        audit::user_created(user.id, &roles);
        Ok(user.id)
    }

    async fn delete_user(&self, actor_id: i32, target_id: i32) -> RbacResult<()> {
        ensure_not_self(actor_id, target_id)?;
        let txn = self.db.begin().await?;

        ensure_user(&txn, target_id).await?;
        let held = roles_of(&txn, target_id).await?;
        let admins = admin_count(&txn).await?;
        ensure_admin_survives("delete_user", target_id, &held, false, admins)?;

        RoleUser::delete_many()
            .filter(RoleUserColumn::UserId.eq(target_id))
            .exec(&txn)
            .await?;
        Users::delete_by_id(target_id).exec(&txn).await?;
        txn.commit().await?;

        audit::user_deleted(actor_id, target_id);
        Ok(())
    }

    async fn admin_count(&self) -> RbacResult<u64> {
        admin_count(&self.db).await
    }
}
