use std::str::FromStr;

use super::Policy;
use crate::auth::AuthContext;
use crate::models::{Owned, UserResource};
use crate::roles::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserAction {
    ViewAny,
    View,
    Create,
    Update,
    Delete,
    AssignRoles,
}

impl FromStr for UserAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewAny" => Ok(UserAction::ViewAny),
            "view" => Ok(UserAction::View),
            "create" => Ok(UserAction::Create),
            "update" => Ok(UserAction::Update),
            "delete" => Ok(UserAction::Delete),
            "assignRoles" => Ok(UserAction::AssignRoles),
            _ => Err(()),
        }
    }
}

/// User management rules. Users may see and edit their own account; all
/// other management is Admin-only, and nobody deletes themselves.
#[derive(Debug, Clone, Default)]
pub struct UserPolicy;

impl Policy for UserPolicy {
    type Action = UserAction;
    type Resource = UserResource;

    fn needs_resource(action: UserAction) -> bool {
        !matches!(action, UserAction::ViewAny | UserAction::Create)
    }

    fn check(&self, ctx: &AuthContext, action: UserAction, target: Option<&UserResource>) -> bool {
        let is_admin = ctx.is(Role::Admin);
        let is_self = target.is_some_and(|t| t.is_owned_by(ctx.user_id));

        match action {
            UserAction::ViewAny | UserAction::Create | UserAction::AssignRoles => is_admin,
            UserAction::View | UserAction::Update => is_admin || is_self,
            UserAction::Delete => is_admin && !is_self,
        }
    }

    fn action_name(action: UserAction) -> &'static str {
        match action {
            UserAction::ViewAny => "viewAny",
            UserAction::View => "view",
            UserAction::Create => "create",
            UserAction::Update => "update",
            UserAction::Delete => "delete",
            UserAction::AssignRoles => "assignRoles",
        }
    }
}
