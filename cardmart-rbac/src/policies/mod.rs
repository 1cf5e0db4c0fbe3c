//! Policy engine
//!
//! Each resource type owns a rule table mapping its actions to a predicate
//! over the caller's roles and, for instance actions, the target resource.
//! [`PolicyEngine`] is the single entry point and dispatches on the tagged
//! [`Action`].

mod order;
mod product;
mod user;

pub use order::{OrderAction, OrderPolicy};
pub use product::{ProductAction, ProductPolicy};
pub use user::{UserAction, UserPolicy};

use cardmart_config::AuthorizationConfig;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::audit;
use crate::auth::AuthContext;
use crate::models::{OrderResource, ProductResource, ResourceType, UserResource};
use crate::roles::Role;

/// Result of a policy check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// Rule table for one resource type
pub trait Policy {
    type Action: Copy + fmt::Debug + FromStr;
    type Resource;

    /// Actions that operate on a specific instance. These are denied when no
    /// resource is supplied.
    fn needs_resource(action: Self::Action) -> bool;

    fn check(&self, ctx: &AuthContext, action: Self::Action, resource: Option<&Self::Resource>) -> bool;

    fn action_name(action: Self::Action) -> &'static str;
}

/// An action tagged with its resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Order(OrderAction),
    Product(ProductAction),
    User(UserAction),
}

impl Action {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Action::Order(_) => ResourceType::Order,
            Action::Product(_) => ResourceType::Product,
            Action::User(_) => ResourceType::User,
        }
    }

    /// Parse an action name for a resource type. `None` for names outside
    /// the resource's rule table.
    pub fn parse(resource: ResourceType, name: &str) -> Option<Action> {
        match resource {
            ResourceType::Order => name.parse().ok().map(Action::Order),
            ResourceType::Product => name.parse().ok().map(Action::Product),
            ResourceType::User => name.parse().ok().map(Action::User),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Order(a) => OrderPolicy::action_name(*a),
            Action::Product(a) => ProductPolicy::action_name(*a),
            Action::User(a) => UserPolicy::action_name(*a),
        }
    }
}

/// A policy target tagged with its resource type
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Order(&'a OrderResource),
    Product(&'a ProductResource),
    User(&'a UserResource),
}

impl Resource<'_> {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Resource::Order(_) => ResourceType::Order,
            Resource::Product(_) => ResourceType::Product,
            Resource::User(_) => ResourceType::User,
        }
    }
}

/// Central authorization entry point
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    admin_bypass: bool,
    orders: OrderPolicy,
    products: ProductPolicy,
    users: UserPolicy,
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(&AuthorizationConfig::default())
    }
}

impl PolicyEngine {
    pub fn new(config: &AuthorizationConfig) -> Self {
        if config.admin_bypass {
            audit::admin_bypass_enabled();
        }

        Self {
            admin_bypass: config.admin_bypass,
            orders: OrderPolicy::new(config.enforce_order_ownership),
            products: ProductPolicy,
            users: UserPolicy,
        }
    }

    /// Turn the Admin short-circuit on or off. Enabling it is audited.
    pub fn set_admin_bypass(&mut self, enabled: bool) {
        if enabled && !self.admin_bypass {
            audit::admin_bypass_enabled();
        }
        self.admin_bypass = enabled;
    }

    pub fn admin_bypass(&self) -> bool {
        self.admin_bypass
    }

    /// Decide whether `ctx` may perform `action`, optionally on `resource`.
    ///
    /// A resource of a different type than the action is denied.
    pub fn authorize(&self, ctx: &AuthContext, action: Action, resource: Option<Resource<'_>>) -> Decision {
        if let Some(resource) = &resource {
            if resource.resource_type() != action.resource_type() {
                debug!(
                    user_id = ctx.user_id,
                    action = action.name(),
                    expected = action.resource_type().as_str(),
                    got = resource.resource_type().as_str(),
                    "Resource type mismatch, denying"
                );
                return Decision::Deny;
            }
        }

        if self.admin_bypass && ctx.is(Role::Admin) {
            audit::admin_bypass_decision(ctx.user_id, action.resource_type().as_str(), action.name());
            return Decision::Allow;
        }

        let allowed = match action {
            Action::Order(a) => evaluate(&self.orders, ctx, a, resource.and_then(as_order)),
            Action::Product(a) => evaluate(&self.products, ctx, a, resource.and_then(as_product)),
            Action::User(a) => evaluate(&self.users, ctx, a, resource.and_then(as_user)),
        };

        debug!(
            user_id = ctx.user_id,
            resource = action.resource_type().as_str(),
            action = action.name(),
            allowed,
            "Policy decision"
        );
        allowed.into()
    }

    /// String-keyed variant of [`authorize`](Self::authorize). Unknown action
    /// names are denied.
    pub fn authorize_named(
        &self,
        ctx: &AuthContext,
        resource_type: ResourceType,
        action: &str,
        resource: Option<Resource<'_>>,
    ) -> Decision {
        match Action::parse(resource_type, action) {
            Some(action) => self.authorize(ctx, action, resource),
            None => {
                debug!(
                    user_id = ctx.user_id,
                    resource = resource_type.as_str(),
                    action,
                    "Unknown action, denying"
                );
                Decision::Deny
            }
        }
    }

    pub fn can(&self, ctx: &AuthContext, action: Action, resource: Option<Resource<'_>>) -> bool {
        self.authorize(ctx, action, resource).is_allowed()
    }
}

fn evaluate<P: Policy>(policy: &P, ctx: &AuthContext, action: P::Action, resource: Option<&P::Resource>) -> bool {
    if P::needs_resource(action) && resource.is_none() {
        return false;
    }
    policy.check(ctx, action, resource)
}

fn as_order<'a>(resource: Resource<'a>) -> Option<&'a OrderResource> {
    match resource {
        Resource::Order(order) => Some(order),
        _ => None,
    }
}

fn as_product<'a>(resource: Resource<'a>) -> Option<&'a ProductResource> {
    match resource {
        Resource::Product(product) => Some(product),
        _ => None,
    }
}

fn as_user<'a>(resource: Resource<'a>) -> Option<&'a UserResource> {
    match resource {
        Resource::User(user) => Some(user),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: i32, owner: Option<i32>) -> OrderResource {
        OrderResource {
            id,
            user_id: owner,
            status: "pending".to_string(),
        }
    }

    fn ctx(user_id: i32, roles: &[Role]) -> AuthContext {
        AuthContext::new(user_id).with_roles(roles.iter().copied())
    }

    #[test]
    fn test_customer_cannot_delete_own_order() {
        let engine = PolicyEngine::default();
        let customer = ctx(5, &[Role::Customer]);
        let own = order(1, Some(5));
        assert_eq!(
            engine.authorize(&customer, Action::Order(OrderAction::Delete), Some(Resource::Order(&own))),
            Decision::Deny
        );
    }

    #[test]
    fn test_employee_can_view_any_customers_order() {
        let engine = PolicyEngine::default();
        let employee = ctx(2, &[Role::Employee]);
        let someone_elses = order(1, Some(99));
        assert!(engine.can(&employee, Action::Order(OrderAction::View), Some(Resource::Order(&someone_elses))));
    }

    #[test]
    fn test_unknown_action_is_denied() {
        let engine = PolicyEngine::default();
        let admin = ctx(1, &[Role::Admin]);
        assert_eq!(
            engine.authorize_named(&admin, ResourceType::Order, "teleport", None),
            Decision::Deny
        );
        assert_eq!(
            engine.authorize_named(&admin, ResourceType::Order, "viewAnalytics", None),
            Decision::Allow
        );
    }

    #[test]
    fn test_instance_action_without_resource_is_denied() {
        let engine = PolicyEngine::default();
        let admin = ctx(1, &[Role::Admin]);
        assert!(!engine.can(&admin, Action::Order(OrderAction::Refund), None));
        assert!(engine.can(&admin, Action::Order(OrderAction::ViewAny), None));
    }

    #[test]
    fn test_mismatched_resource_is_denied() {
        let engine = PolicyEngine::default();
        let admin = ctx(1, &[Role::Admin]);
        let product = ProductResource { id: 3 };
        assert!(!engine.can(&admin, Action::Order(OrderAction::View), Some(Resource::Product(&product))));
    }

    #[test]
    fn test_admin_bypass_is_off_by_default() {
        let mut engine = PolicyEngine::default();
        assert!(!engine.admin_bypass());

        let admin = ctx(1, &[Role::Admin]);
        let own_account = UserResource { id: 1 };
        assert!(!engine.can(&admin, Action::User(UserAction::Delete), Some(Resource::User(&own_account))));

        engine.set_admin_bypass(true);
        assert!(engine.can(&admin, Action::User(UserAction::Delete), Some(Resource::User(&own_account))));
    }

    #[test]
    fn test_bypass_does_not_apply_to_non_admins() {
        let config = AuthorizationConfig {
            admin_bypass: true,
            ..Default::default()
        };
        let engine = PolicyEngine::new(&config);
        let employee = ctx(2, &[Role::Employee]);
        assert!(!engine.can(&employee, Action::Order(OrderAction::Refund), Some(Resource::Order(&order(1, None)))));
    }

    #[test]
    fn test_decisions_are_deterministic() {
        let engine = PolicyEngine::default();
        let subjects = [
            ctx(1, &[Role::Admin]),
            ctx(2, &[Role::Employee]),
            ctx(3, &[Role::Customer]),
            ctx(4, &[]),
        ];
        let target = order(10, Some(3));

        for subject in &subjects {
            for name in ["viewAny", "view", "create", "update", "delete", "refund", "ship", "cancel", "viewAnalytics"] {
                let first = engine.authorize_named(subject, ResourceType::Order, name, Some(Resource::Order(&target)));
                let second = engine.authorize_named(subject, ResourceType::Order, name, Some(Resource::Order(&target)));
                assert_eq!(first, second);
            }
        }
    }
}
