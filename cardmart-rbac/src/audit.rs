//! Authorization audit events
//!
//! Every event goes to the `cardmart::audit` tracing target with a fixed
//! `event` field, so operators can route them separately from diagnostics.

use cardmart_logging::AUDIT_TARGET;
use cardmart_storage::ConnectionTier;
use tracing::{error, info, warn};

use crate::roles::{Role, RoleSet};

pub fn role_assigned(user_id: i32, role: Role) {
    info!(target: AUDIT_TARGET, event = "role_assigned", user_id, role = %role);
}

pub fn role_detached(user_id: i32, role: Role) {
    info!(target: AUDIT_TARGET, event = "role_detached", user_id, role = %role);
}

pub fn roles_synced(user_id: i32, roles: &RoleSet) {
    info!(target: AUDIT_TARGET, event = "roles_synced", user_id, roles = ?roles.names());
}

pub fn user_created(user_id: i32, roles: &RoleSet) {
    info!(target: AUDIT_TARGET, event = "user_created", user_id, roles = ?roles.names());
}

pub fn user_deleted(actor_id: i32, user_id: i32) {
    info!(target: AUDIT_TARGET, event = "user_deleted", actor_id, user_id);
}

pub fn invariant_rejected(action: &str, user_id: i32, message: &str) {
    warn!(target: AUDIT_TARGET, event = "invariant_rejected", action, user_id, message);
}

pub fn admin_bypass_enabled() {
    warn!(target: AUDIT_TARGET, event = "admin_bypass_enabled", "Admin policy bypass is enabled");
}

pub fn admin_bypass_decision(user_id: i32, resource: &str, action: &str) {
    warn!(target: AUDIT_TARGET, event = "admin_bypass_decision", user_id, resource, action, "Policy bypassed for Admin");
}

pub fn tier_denied(user_id: Option<i32>, tier: ConnectionTier, reason: &str) {
    warn!(target: AUDIT_TARGET, event = "tier_denied", user_id = ?user_id, tier = %tier, reason);
}

pub fn tier_elevated(user_id: i32, tier: ConnectionTier) {
    info!(target: AUDIT_TARGET, event = "tier_elevated", user_id, tier = %tier);
}

/// The database rejected a statement under a tier credential after the
/// gatekeeper had allowed the call
pub fn vault_rejected(user_id: i32, tier: ConnectionTier, action: &str, error: &dyn std::fmt::Display) {
    error!(target: AUDIT_TARGET, event = "vault_rejected", user_id, tier = %tier, action, error = %error);
}
