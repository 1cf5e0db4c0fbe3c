//! Error types for RBAC operations

use cardmart_storage::{ConnectionTier, StorageError};
use thiserror::Error;

/// Result type for RBAC operations
pub type RbacResult<T> = Result<T, RbacError>;

/// RBAC-specific errors
#[derive(Error, Debug)]
pub enum RbacError {
    /// No authenticated user on the request
    #[error("Authentication required")]
    Unauthenticated,

    /// Role gate rejection. Carries only the roles that would have passed.
    #[error("Insufficient role: requires one of {}", .acceptable.join(", "))]
    InsufficientRole { acceptable: Vec<String> },

    /// Tier executor gatekeeper rejection
    #[error("Insufficient role permissions for {tier} tier: {reason}")]
    RolePermissionDenied { tier: ConnectionTier, reason: String },

    /// A write that would break a role-membership invariant
    #[error("Invariant violation: {message}")]
    InvariantViolation { message: String },

    /// Role name outside the fixed set
    #[error("Unknown role: {role_name}")]
    UnknownRole { role_name: String },

    /// User not found
    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i32 },

    /// The tier credential could not be bound
    #[error("Connection tier unavailable: {tier}")]
    TierUnavailable { tier: ConnectionTier },

    /// Database operation failed, including privilege rejections raised by
    /// the database under a tier credential
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RbacError {
    pub fn insufficient_role<I, S>(acceptable: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::InsufficientRole {
            acceptable: acceptable.into_iter().map(Into::into).collect(),
        }
    }

    pub fn role_permission_denied(tier: ConnectionTier, reason: impl Into<String>) -> Self {
        Self::RolePermissionDenied {
            tier,
            reason: reason.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    pub fn unknown_role(role_name: impl Into<String>) -> Self {
        Self::UnknownRole {
            role_name: role_name.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Application-layer denial (role gate or tier gatekeeper)
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated | Self::InsufficientRole { .. } | Self::RolePermissionDenied { .. }
        )
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound { .. } | Self::UnknownRole { .. })
    }

    /// Failure below the authorization layer: database, storage or binding
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Storage(_) | Self::TierUnavailable { .. } | Self::Internal { .. }
        )
    }

    /// The database refused the statement under the bound credential
    pub fn is_privilege_violation(&self) -> bool {
        match self {
            Self::Database(err) => cardmart_storage::error::is_privilege_violation(err),
            Self::Storage(err) => err.is_privilege_violation(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbErr, RuntimeErr};

    #[test]
    fn test_role_permission_message() {
        let err = RbacError::role_permission_denied(ConnectionTier::SystemAdmin, "requires Admin");
        assert!(err.to_string().contains("role permissions"));
        assert!(err.is_permission_denied());
        assert!(!err.is_infrastructure());
    }

    #[test]
    fn test_vault_rejection_is_infrastructure() {
        let err: RbacError = DbErr::Exec(RuntimeErr::Internal(
            "permission denied for table orders".to_string(),
        ))
        .into();
        assert!(err.is_infrastructure());
        assert!(err.is_privilege_violation());
        assert!(!err.is_permission_denied());
    }

    #[test]
    fn test_insufficient_role_lists_acceptable_only() {
        let err = RbacError::insufficient_role(["Admin", "Employee"]);
        assert_eq!(err.to_string(), "Insufficient role: requires one of Admin, Employee");
    }
}
