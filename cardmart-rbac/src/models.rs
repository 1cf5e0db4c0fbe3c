//! Resources the policy engine decides on

use cardmart_storage::entities;
use serde::{Deserialize, Serialize};

/// A resource with an optional owning user
pub trait Owned {
    fn owner_id(&self) -> Option<i32>;

    /// Ownership requires a concrete owner; an ownerless resource belongs
    /// to nobody.
    fn is_owned_by(&self, user_id: i32) -> bool {
        self.owner_id() == Some(user_id)
    }
}

/// Resource types with their own rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Order,
    Product,
    User,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Order => "order",
            ResourceType::Product => "product",
            ResourceType::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResource {
    pub id: i32,
    pub user_id: Option<i32>,
    pub status: String,
}

impl Owned for OrderResource {
    fn owner_id(&self) -> Option<i32> {
        self.user_id
    }
}

impl From<&entities::Order> for OrderResource {
    fn from(order: &entities::Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductResource {
    pub id: i32,
}

impl From<&entities::Product> for ProductResource {
    fn from(product: &entities::Product) -> Self {
        Self { id: product.id }
    }
}

/// A user as the target of a user-management action. Users own themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResource {
    pub id: i32,
}

impl Owned for UserResource {
    fn owner_id(&self) -> Option<i32> {
        Some(self.id)
    }
}

impl From<&entities::User> for UserResource {
    fn from(user: &entities::User) -> Self {
        Self { id: user.id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ownerless_order_is_nobodys() {
        let order = OrderResource {
            id: 1,
            user_id: None,
            status: "pending".to_string(),
        };
        assert!(!order.is_owned_by(0));
        assert!(!order.is_owned_by(1));
    }

    #[test]
    fn test_user_owns_self() {
        assert!(UserResource { id: 4 }.is_owned_by(4));
        assert!(!UserResource { id: 4 }.is_owned_by(5));
    }
}
