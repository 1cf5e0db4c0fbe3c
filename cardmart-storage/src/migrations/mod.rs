use sea_orm::DatabaseConnection;
use sea_orm_migration::prelude::*;
use tracing::info;

use crate::error::{StorageError, StorageResult};

mod m20250301_000001_create_auth_tables;
mod m20250301_000002_create_commerce_tables;
mod m20250301_000003_seed_roles;

pub use m20250301_000003_seed_roles::SEEDED_ROLE_NAMES;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_auth_tables::Migration),
            Box::new(m20250301_000002_create_commerce_tables::Migration),
            Box::new(m20250301_000003_seed_roles::Migration),
        ]
    }
}

/// Apply every pending migration, including the role seed
pub async fn apply(db: &DatabaseConnection) -> StorageResult<()> {
    info!("Applying migrations");
    Migrator::up(db, None)
        .await
        .map_err(|e| StorageError::Migration(e.to_string()))
}

/// Roll back every applied migration
pub async fn rollback(db: &DatabaseConnection) -> StorageResult<()> {
    info!("Rolling back all migrations");
    Migrator::down(db, None)
        .await
        .map_err(|e| StorageError::Migration(e.to_string()))
}
