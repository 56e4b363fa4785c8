//! Newtype ids so a user id can never be passed where a chef-profile id is
//! expected (and the other way round).
//!
//! `Meal.chef_id` and `Order.chef_id` hold the chef's [`UserId`];
//! `Review.chef_id`, `Subscription.chef_id` and `ChefSpecialty.chef_id` hold a
//! [`ChefId`]. Crossing between the two always goes through the `chefs` row.

use uuid::Uuid;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
            ::utoipa::ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Fresh random id for a row about to be inserted.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<$name> for $crate::store::FilterValue {
            fn from(id: $name) -> Self {
                $crate::store::FilterValue::Uuid(id.0)
            }
        }
    };
}

define_id!(UserId);
define_id!(ChefId);
define_id!(MealId);
define_id!(OrderId);
define_id!(OrderItemId);
define_id!(ReviewId);
define_id!(SubscriptionId);
define_id!(SpecialtyId);
define_id!(RoleAssignmentId);
