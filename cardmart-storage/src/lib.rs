//! Persistence layer for cardmart
//!
//! - SeaORM entities for users, roles and the `role_user` pivot
//! - Migrations, including the fixed role seed
//! - Database credential tiers and their privilege sets
//! - A registry holding one connection pool per configured tier
//! - Provisioning SQL for the tier credentials

pub mod entities;
pub mod error;
pub mod grants;
pub mod migrations;
pub mod registry;
pub mod tier;

pub use error::{StorageError, StorageResult};
pub use migrations::{apply as apply_migrations, rollback as rollback_migrations, Migrator, SEEDED_ROLE_NAMES};
pub use registry::{ConnectionRegistry, TierHealth};
pub use tier::{ConnectionTier, Privilege, PrivilegeSet};

/// Re-export so downstream crates agree on the SeaORM version
pub use sea_orm;
