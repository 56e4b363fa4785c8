pub mod chef_specialties;
pub mod chefs;
pub mod meals;
pub mod order_items;
pub mod orders;
pub mod profiles;
pub mod reviews;
pub mod subscriptions;
pub mod user_roles;

pub use chef_specialties::Entity as ChefSpecialties;
pub use chefs::Entity as Chefs;
pub use meals::Entity as Meals;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use profiles::Entity as Profiles;
pub use reviews::Entity as Reviews;
pub use subscriptions::Entity as Subscriptions;
pub use user_roles::Entity as UserRoles;
