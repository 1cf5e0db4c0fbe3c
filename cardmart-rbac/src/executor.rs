//! Operation-tier executor
//!
//! Runs a unit of work under a named operation tier's credential after an
//! application-level check of the caller's role. The previous binding is
//! restored however the work ends.

use cardmart_config::AuthorizationConfig;
use cardmart_storage::ConnectionTier;
use sea_orm::DatabaseConnection;
use std::fmt;
use std::future::Future;
use tracing::{debug, error};

use crate::audit;
use crate::auth::{highest_role_of, AuthContext};
use crate::config::TierPolicy;
use crate::error::{RbacError, RbacResult};
use crate::vault::ConnectionHandle;

type Check<'a> = Box<dyn Fn(&AuthContext) -> bool + Send + Sync + 'a>;

/// A request to run work at an operation tier
pub struct TierOperation<'a> {
    tier: ConnectionTier,
    action: &'a str,
    checks: Vec<(&'a str, Check<'a>)>,
}

impl<'a> TierOperation<'a> {
    /// `action` names the work in logs and audit events
    pub fn new(tier: ConnectionTier, action: &'a str) -> Self {
        Self {
            tier,
            action,
            checks: Vec::new(),
        }
    }

    /// Add a caller predicate that must hold in addition to the tier's
    /// minimum role
    pub fn with_check<F>(mut self, name: &'a str, check: F) -> Self
    where
        F: Fn(&AuthContext) -> bool + Send + Sync + 'a,
    {
        self.checks.push((name, Box::new(check)));
        self
    }

    pub fn tier(&self) -> ConnectionTier {
        self.tier
    }

    pub fn action(&self) -> &str {
        self.action
    }
}

impl fmt::Debug for TierOperation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TierOperation")
            .field("tier", &self.tier)
            .field("action", &self.action)
            .field("checks", &self.checks.iter().map(|(name, _)| *name).collect::<Vec<_>>())
            .finish()
    }
}

/// Restores the saved tier when dropped
struct RestoreGuard<'h, H: ConnectionHandle + ?Sized> {
    handle: &'h mut H,
    previous: ConnectionTier,
}

impl<H: ConnectionHandle + ?Sized> Drop for RestoreGuard<'_, H> {
    fn drop(&mut self) {
        match self.handle.bind(self.previous) {
            Ok(()) => debug!(tier = %self.previous, "Restored connection tier"),
            Err(e) => error!(tier = %self.previous, error = %e, "Failed to restore connection tier"),
        }
    }
}

/// Gatekeeper plus credential switch for tiered work
#[derive(Debug, Clone, Default)]
pub struct TierExecutor {
    policy: TierPolicy,
}

impl TierExecutor {
    pub fn new(policy: TierPolicy) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &AuthorizationConfig) -> RbacResult<Self> {
        Ok(Self::new(TierPolicy::from_config(config)?))
    }

    pub fn policy(&self) -> &TierPolicy {
        &self.policy
    }

    /// Application-layer check only. Returns the authenticated caller.
    pub fn authorize<'c>(&self, ctx: Option<&'c AuthContext>, operation: &TierOperation<'_>) -> RbacResult<&'c AuthContext> {
        let tier = operation.tier;

        let Some(caller) = ctx else {
            audit::tier_denied(None, tier, "unauthenticated");
            return Err(RbacError::Unauthenticated);
        };

        let Some(minimum) = self.policy.minimum_role(tier) else {
            let reason = format!("{} is not an operation tier", tier);
            audit::tier_denied(Some(caller.user_id), tier, &reason);
            return Err(RbacError::role_permission_denied(tier, reason));
        };

        if highest_role_of(ctx) < Some(minimum) {
            let reason = format!("requires {} or higher", minimum);
            audit::tier_denied(Some(caller.user_id), tier, &reason);
            return Err(RbacError::role_permission_denied(tier, reason));
        }

        for (name, check) in &operation.checks {
            if !check(caller) {
                let reason = format!("check '{}' failed", name);
                audit::tier_denied(Some(caller.user_id), tier, &reason);
                return Err(RbacError::role_permission_denied(tier, reason));
            }
        }

        Ok(caller)
    }

    /// Run `callback` with the tier's connection.
    ///
    /// Nothing is bound and the callback never runs unless the caller
    /// passes [`authorize`](Self::authorize). The handle's previous tier is
    /// restored on success, error, panic and cancellation alike. A statement
    /// the database refuses under the tier credential surfaces as an
    /// infrastructure error, never as `RolePermissionDenied`.
    pub async fn execute_at_tier<H, F, Fut, T>(
        &self,
        ctx: Option<&AuthContext>,
        handle: &mut H,
        operation: TierOperation<'_>,
        callback: F,
    ) -> RbacResult<T>
    where
        H: ConnectionHandle + ?Sized,
        F: FnOnce(DatabaseConnection) -> Fut,
        Fut: Future<Output = RbacResult<T>>,
    {
        let caller = self.authorize(ctx, &operation)?;
        let tier = operation.tier;

        let previous = handle.active_tier();
        if let Err(e) = handle.bind(tier) {
            error!(user_id = caller.user_id, tier = %tier, action = operation.action, error = %e, "Could not bind tier credential");
            return Err(e);
        }
        let guard = RestoreGuard { handle, previous };
        audit::tier_elevated(caller.user_id, tier);

        let connection = guard.handle.connection();
        let result = callback(connection).await;
        drop(guard);

        if let Err(e) = &result {
            if e.is_privilege_violation() {
                audit::vault_rejected(caller.user_id, tier, operation.action, e);
            }
        }
        result
    }
}
