use std::str::FromStr;

use super::Policy;
use crate::auth::AuthContext;
use crate::models::ProductResource;
use crate::roles::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductAction {
    ViewAny,
    View,
    Create,
    Update,
    Delete,
    ManageStock,
}

impl FromStr for ProductAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewAny" => Ok(ProductAction::ViewAny),
            "view" => Ok(ProductAction::View),
            "create" => Ok(ProductAction::Create),
            "update" => Ok(ProductAction::Update),
            "delete" => Ok(ProductAction::Delete),
            "manageStock" => Ok(ProductAction::ManageStock),
            _ => Err(()),
        }
    }
}

/// Catalog rules. Anyone with a role may browse; staff maintain the
/// catalog and only Admins remove products.
#[derive(Debug, Clone, Default)]
pub struct ProductPolicy;

impl Policy for ProductPolicy {
    type Action = ProductAction;
    type Resource = ProductResource;

    fn needs_resource(action: ProductAction) -> bool {
        !matches!(action, ProductAction::ViewAny | ProductAction::Create)
    }

    fn check(&self, ctx: &AuthContext, action: ProductAction, _product: Option<&ProductResource>) -> bool {
        let roles = &ctx.roles;
        match action {
            ProductAction::ViewAny | ProductAction::View => !roles.is_empty(),
            ProductAction::Create | ProductAction::Update | ProductAction::ManageStock => {
                roles.has_any(&[Role::Admin, Role::Employee])
            }
            ProductAction::Delete => roles.has(Role::Admin),
        }
    }

    fn action_name(action: ProductAction) -> &'static str {
        match action {
            ProductAction::ViewAny => "viewAny",
            ProductAction::View => "view",
            ProductAction::Create => "create",
            ProductAction::Update => "update",
            ProductAction::Delete => "delete",
            ProductAction::ManageStock => "manageStock",
        }
    }
}
