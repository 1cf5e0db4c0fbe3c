use std::str::FromStr;

use super::Policy;
use crate::auth::AuthContext;
use crate::models::{OrderResource, Owned};
use crate::roles::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderAction {
    ViewAny,
    View,
    Create,
    Update,
    Delete,
    Refund,
    Ship,
    Cancel,
    ViewAnalytics,
}

impl FromStr for OrderAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewAny" => Ok(OrderAction::ViewAny),
            "view" => Ok(OrderAction::View),
            "create" => Ok(OrderAction::Create),
            "update" => Ok(OrderAction::Update),
            "delete" => Ok(OrderAction::Delete),
            "refund" => Ok(OrderAction::Refund),
            "ship" => Ok(OrderAction::Ship),
            "cancel" => Ok(OrderAction::Cancel),
            "viewAnalytics" => Ok(OrderAction::ViewAnalytics),
            _ => Err(()),
        }
    }
}

/// Order rules.
///
/// Staff see every order. Customers see only their own unless ownership
/// enforcement is switched off, in which case any customer may view any
/// order.
#[derive(Debug, Clone)]
pub struct OrderPolicy {
    enforce_ownership: bool,
}

impl OrderPolicy {
    pub fn new(enforce_ownership: bool) -> Self {
        Self { enforce_ownership }
    }
}

impl Policy for OrderPolicy {
    type Action = OrderAction;
    type Resource = OrderResource;

    fn needs_resource(action: OrderAction) -> bool {
        !matches!(
            action,
            OrderAction::ViewAny | OrderAction::Create | OrderAction::ViewAnalytics
        )
    }

    fn check(&self, ctx: &AuthContext, action: OrderAction, order: Option<&OrderResource>) -> bool {
        let roles = &ctx.roles;
        let owns = order.is_some_and(|o| o.is_owned_by(ctx.user_id));

        match action {
            OrderAction::ViewAny => !roles.is_empty(),
            OrderAction::View => {
                roles.has_any(&[Role::Admin, Role::Employee])
                    || (roles.has(Role::Customer) && (owns || !self.enforce_ownership))
            }
            OrderAction::Create => roles.has_any(&[Role::Customer, Role::Admin]),
            OrderAction::Update | OrderAction::Ship => roles.has_any(&[Role::Admin, Role::Employee]),
            OrderAction::Delete | OrderAction::Refund | OrderAction::ViewAnalytics => roles.has(Role::Admin),
            OrderAction::Cancel => roles.has(Role::Admin) || (roles.has(Role::Customer) && owns),
        }
    }

    fn action_name(action: OrderAction) -> &'static str {
        match action {
            OrderAction::ViewAny => "viewAny",
            OrderAction::View => "view",
            OrderAction::Create => "create",
            OrderAction::Update => "update",
            OrderAction::Delete => "delete",
            OrderAction::Refund => "refund",
            OrderAction::Ship => "ship",
            OrderAction::Cancel => "cancel",
            OrderAction::ViewAnalytics => "viewAnalytics",
        }
    }
}
