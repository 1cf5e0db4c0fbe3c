//! Role-based access control for cardmart
//!
//! Two independent layers guard every data access:
//! - the gatekeeper: role gate middleware, policy engine and the tier
//!   executor's role check, all evaluated in the application
//! - the vault: per-tier database credentials whose grants the database
//!   enforces regardless of what the application decided

pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod executor;
pub mod middleware;
pub mod models;
pub mod policies;
pub mod roles;
pub mod store;
pub mod vault;

pub use auth::AuthContext;
pub use config::TierPolicy;
pub use error::{RbacError, RbacResult};
pub use executor::{TierExecutor, TierOperation};
pub use middleware::{ClientKind, GateRejection, RequiredRoles, RoleGate};
pub use models::{OrderResource, Owned, ProductResource, ResourceType, UserResource};
pub use policies::{Action, Decision, PolicyEngine, Resource};
pub use roles::{Role, RoleSet};
pub use store::{InMemoryRoleStore, RoleStore, SeaOrmRoleStore};
pub use vault::{bind_request_connection, select_connection_for_user, select_tier_for, ConnectionHandle, ScopedConnection};

/// Re-export so callers name tiers without depending on the storage crate
pub use cardmart_storage::ConnectionTier;
