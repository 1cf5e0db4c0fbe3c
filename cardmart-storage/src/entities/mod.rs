//! SeaORM entities

pub mod orders;
pub mod products;
pub mod role_user;
pub mod roles;
pub mod users;

pub use orders::{ActiveModel as OrderActiveModel, Column as OrderColumn, Entity as Orders, Model as Order};
pub use products::{ActiveModel as ProductActiveModel, Column as ProductColumn, Entity as Products, Model as Product};
pub use role_user::{ActiveModel as RoleUserActiveModel, Column as RoleUserColumn, Entity as RoleUser, Model as RoleUserRow};
pub use roles::{ActiveModel as RoleActiveModel, Column as RoleColumn, Entity as Roles, Model as RoleRow};
pub use users::{ActiveModel as UserActiveModel, Column as UserColumn, Entity as Users, Model as User};
