//! Role assignment store against a migrated, file-backed SQLite database

use anyhow::Result;
use cardmart_rbac::{
    select_connection_for_user, AuthContext, ConnectionTier, RbacError, Role, RoleSet, RoleStore, SeaOrmRoleStore,
};
use cardmart_storage::Migrator;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use tempfile::TempDir;

async fn migrated_store() -> Result<(TempDir, SeaOrmRoleStore)> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("roles.db").display());

    let mut opts = ConnectOptions::new(url);
    opts.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await?;
    Migrator::up(&db, None).await?;

    Ok((dir, SeaOrmRoleStore::new(db)))
}

fn is_invariant(err: &RbacError) -> bool {
    matches!(err, RbacError::InvariantViolation { .. })
}

#[tokio::test]
async fn test_registration_grants_customer() -> Result<()> {
    let (_dir, store) = migrated_store().await?;
    let id = store.register_user("buyer@cardmart.test", "hash").await?;

    assert_eq!(store.roles_of(id).await?, RoleSet::from([Role::Customer]));
    assert!(store.has_role(id, "Customer").await?);
    assert!(!store.has_role(id, "Admin").await?);
    assert!(matches!(
        store.has_role(id, "Moderator").await,
        Err(RbacError::UnknownRole { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_sole_admin_keeps_admin_role() -> Result<()> {
    let (_dir, store) = migrated_store().await?;
    let admin = store.create_user_with_roles("admin@cardmart.test", "hash", &["Admin"]).await?;

    let err = store.detach_role(admin, "Admin").await.unwrap_err();
    assert!(is_invariant(&err));
    assert!(store.has_role(admin, "Admin").await?);

    let err = store.sync_roles(admin, &["Employee"]).await.unwrap_err();
    assert!(is_invariant(&err));
    assert_eq!(store.roles_of(admin).await?, RoleSet::from([Role::Admin]));
    assert_eq!(store.admin_count().await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_second_admin_can_be_demoted() -> Result<()> {
    let (_dir, store) = migrated_store().await?;
    let first = store.create_user_with_roles("a1@cardmart.test", "hash", &["Admin"]).await?;
    let second = store.create_user_with_roles("a2@cardmart.test", "hash", &["Admin", "Employee"]).await?;
    assert_eq!(store.admin_count().await?, 2);

    store.detach_role(second, "Admin").await?;
    assert_eq!(store.roles_of(second).await?, RoleSet::from([Role::Employee]));
    assert_eq!(store.admin_count().await?, 1);

    assert!(is_invariant(&store.detach_role(first, "Admin").await.unwrap_err()));
    Ok(())
}

#[tokio::test]
async fn test_assign_then_detach_restores_roles() -> Result<()> {
    let (_dir, store) = migrated_store().await?;
    store.create_user_with_roles("admin@cardmart.test", "hash", &["Admin"]).await?;
    let id = store.register_user("staff@cardmart.test", "hash").await?;
    let before = store.roles_of(id).await?;

    for role in ["Employee", "Admin"] {
        store.assign_role(id, role).await?;
        assert!(store.has_role(id, role).await?);
        store.detach_role(id, role).await?;
        assert_eq!(store.roles_of(id).await?, before, "after {}", role);
    }
    Ok(())
}

#[tokio::test]
async fn test_sync_replaces_role_set() -> Result<()> {
    let (_dir, store) = migrated_store().await?;
    let id = store.register_user("staff@cardmart.test", "hash").await?;

    store.sync_roles(id, &["Employee", "Customer"]).await?;
    assert_eq!(store.roles_of(id).await?, RoleSet::from([Role::Customer, Role::Employee]));

    store.sync_roles(id, &["Employee"]).await?;
    assert_eq!(store.roles_of(id).await?, RoleSet::from([Role::Employee]));

    assert!(matches!(
        store.sync_roles(id, &["Employee", "owner"]).await,
        Err(RbacError::UnknownRole { .. })
    ));
    assert_eq!(store.roles_of(id).await?, RoleSet::from([Role::Employee]));
    Ok(())
}

#[tokio::test]
async fn test_delete_user_guards() -> Result<()> {
    let (_dir, store) = migrated_store().await?;
    let admin = store.create_user_with_roles("admin@cardmart.test", "hash", &["Admin"]).await?;
    let customer = store.register_user("buyer@cardmart.test", "hash").await?;

    assert!(is_invariant(&store.delete_user(admin, admin).await.unwrap_err()));
    assert!(is_invariant(&store.delete_user(customer, admin).await.unwrap_err()));

    store.delete_user(admin, customer).await?;
    assert!(matches!(
        store.roles_of(customer).await,
        Err(RbacError::UserNotFound { user_id }) if user_id == customer
    ));
    assert!(store.roles_of(admin).await?.has(Role::Admin));
    Ok(())
}

#[tokio::test]
async fn test_stored_roles_drive_connection_tier() -> Result<()> {
    let (_dir, store) = migrated_store().await?;
    let admin = store.create_user_with_roles("admin@cardmart.test", "hash", &["Customer", "Admin"]).await?;
    let staff = store.create_user_with_roles("staff@cardmart.test", "hash", &["Employee"]).await?;
    let buyer = store.register_user("buyer@cardmart.test", "hash").await?;

    let expected = [
        (admin, ConnectionTier::AdminOps),
        (staff, ConnectionTier::DataEntry),
        (buyer, ConnectionTier::Read),
    ];
    for (user_id, tier) in expected {
        let ctx = AuthContext::new(user_id).with_roles(store.roles_of(user_id).await?.iter());
        assert_eq!(select_connection_for_user(Some(&ctx)), tier, "user {}", user_id);
    }
    Ok(())
}
