//! Connection selector
//!
//! Every request carries its own [`ScopedConnection`], reset to the READ
//! tier when the request starts and then bound to the tier matching the
//! caller's highest role. The tier credential is the vault: whatever the
//! application layer decides, the database only accepts what that
//! credential was granted.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use cardmart_storage::{ConnectionRegistry, ConnectionTier};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::{highest_role_of, AuthContext};
use crate::error::{RbacError, RbacResult};
use crate::roles::Role;

/// Ambient tier for a caller's highest role
pub fn select_tier_for(role: Option<Role>) -> ConnectionTier {
    match role {
        Some(Role::Admin) => ConnectionTier::AdminOps,
        Some(Role::Employee) => ConnectionTier::DataEntry,
        Some(Role::Customer) | None => ConnectionTier::Read,
    }
}

pub fn select_connection_for_user(ctx: Option<&AuthContext>) -> ConnectionTier {
    select_tier_for(highest_role_of(ctx))
}

/// A data-access handle that can be rebound to another credential tier
#[cfg_attr(test, mockall::automock)]
pub trait ConnectionHandle: Send {
    /// Tier currently bound
    fn active_tier(&self) -> ConnectionTier;

    /// Bind to `tier`. Fails when the tier's credential is not connected;
    /// the binding is unchanged on failure.
    fn bind(&mut self, tier: ConnectionTier) -> RbacResult<()>;

    /// Connection for the bound tier
    fn connection(&self) -> DatabaseConnection;
}

/// Request-scoped connection binding over a shared [`ConnectionRegistry`]
#[derive(Debug, Clone)]
pub struct ScopedConnection {
    registry: Arc<ConnectionRegistry>,
    active: ConnectionTier,
}

impl ScopedConnection {
    /// A fresh binding at the least-privileged tier
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        let mut scoped = Self {
            registry,
            active: ConnectionTier::Default,
        };
        scoped.select(ConnectionTier::Read);
        scoped
    }

    /// Bind to the tier matching the caller's highest role
    pub fn select_for_user(&mut self, ctx: Option<&AuthContext>) -> ConnectionTier {
        let tier = select_connection_for_user(ctx);
        self.select(tier)
    }

    /// Bind to `tier`, or keep the default connection when that tier is not
    /// connected. Returns the tier actually bound.
    pub fn select(&mut self, tier: ConnectionTier) -> ConnectionTier {
        if self.registry.is_available(tier) {
            self.active = tier;
        } else {
            warn!(tier = %tier, "Tier credential unavailable, using default connection");
            self.active = ConnectionTier::Default;
        }
        self.active
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }
}

impl ConnectionHandle for ScopedConnection {
    fn active_tier(&self) -> ConnectionTier {
        self.active
    }

    fn bind(&mut self, tier: ConnectionTier) -> RbacResult<()> {
        if !self.registry.is_available(tier) {
            return Err(RbacError::TierUnavailable { tier });
        }
        self.active = tier;
        Ok(())
    }

    fn connection(&self) -> DatabaseConnection {
        self.registry
            .get(self.active)
            .unwrap_or_else(|| self.registry.default_connection())
            .clone()
    }
}

/// axum middleware that gives each request its own [`ScopedConnection`],
/// bound for the authenticated user if any. Install it after the identity
/// layer so the [`AuthContext`] extension is present.
pub async fn bind_request_connection(
    State(registry): State<Arc<ConnectionRegistry>>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut scoped = ScopedConnection::new(registry);
    let tier = scoped.select_for_user(request.extensions().get::<AuthContext>());
    debug!(tier = %tier, path = %request.uri().path(), "Bound request connection");

    request.extensions_mut().insert(scoped);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(tiers: &[ConnectionTier]) -> Arc<ConnectionRegistry> {
        Arc::new(ConnectionRegistry::from_connections(
            DatabaseConnection::Disconnected,
            tiers.iter().map(|t| (*t, DatabaseConnection::Disconnected)),
        ))
    }

    #[test]
    fn test_highest_role_selects_tier() {
        assert_eq!(select_tier_for(Some(Role::Admin)), ConnectionTier::AdminOps);
        assert_eq!(select_tier_for(Some(Role::Employee)), ConnectionTier::DataEntry);
        assert_eq!(select_tier_for(Some(Role::Customer)), ConnectionTier::Read);
        assert_eq!(select_tier_for(None), ConnectionTier::Read);

        let both = AuthContext::new(1).with_roles([Role::Customer, Role::Admin]);
        assert_eq!(select_connection_for_user(Some(&both)), ConnectionTier::AdminOps);
    }

    #[test]
    fn test_new_binding_starts_at_read() {
        let scoped = ScopedConnection::new(registry(&ConnectionTier::OPERATION_TIERS));
        assert_eq!(scoped.active_tier(), ConnectionTier::Read);
    }

    #[test]
    fn test_selector_falls_back_to_default() {
        let mut scoped = ScopedConnection::new(registry(&[ConnectionTier::Read]));
        let employee = AuthContext::new(2).with_role(Role::Employee);
        assert_eq!(scoped.select_for_user(Some(&employee)), ConnectionTier::Default);
        assert_eq!(scoped.active_tier(), ConnectionTier::Default);
    }

    #[test]
    fn test_bind_fails_closed() {
        let mut scoped = ScopedConnection::new(registry(&[ConnectionTier::Read]));
        let err = scoped.bind(ConnectionTier::SystemAdmin).unwrap_err();
        assert!(matches!(err, RbacError::TierUnavailable { tier: ConnectionTier::SystemAdmin }));
        assert_eq!(scoped.active_tier(), ConnectionTier::Read);
        assert!(scoped.bind(ConnectionTier::Default).is_ok());
    }
}
