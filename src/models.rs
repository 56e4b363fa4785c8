use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    ids::{
        ChefId, MealId, OrderId, OrderItemId, ReviewId, RoleAssignmentId, SpecialtyId,
        SubscriptionId, UserId,
    },
    store::{FilterValue, Record, Table},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Chef,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Chef => "chef",
            Role::Customer => "customer",
        }
    }

    /// Lenient parse used for the denormalized claim; unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Role::Admin),
            "chef" => Some(Role::Chef),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }
}

/// The signed-in principal as the auth provider describes it.
///
/// `role_claim` is the denormalized role copied into the token at sign-in.
/// It is good enough for picking navigation entries and never for deciding
/// admin access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role_claim: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RoleAssignment {
    pub id: RoleAssignmentId,
    pub user_id: UserId,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Chef {
    pub id: ChefId,
    pub user_id: UserId,
    pub bio: Option<String>,
    pub kitchen_photo_url: Option<String>,
    pub verification_status: VerificationStatus,
    pub is_featured: bool,
    pub avg_rating: f64,
    pub total_reviews: i32,
    pub total_orders: i32,
    pub hygiene_certificate: bool,
    pub fssai_license: bool,
    pub created_at: DateTime<Utc>,
}

impl Chef {
    /// A blank, pending profile for a user who just gained the chef role.
    pub fn pending_for(user_id: UserId) -> Self {
        Self {
            id: ChefId::new(),
            user_id,
            bio: None,
            kitchen_photo_url: None,
            verification_status: VerificationStatus::Pending,
            is_featured: false,
            avg_rating: 0.0,
            total_reviews: 0,
            total_orders: 0,
            hygiene_certificate: false,
            fssai_license: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChefSpecialty {
    pub id: SpecialtyId,
    pub chef_id: ChefId,
    pub specialty: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Meal {
    pub id: MealId,
    /// Owning chef's user id, not the chef-profile id.
    pub chef_id: UserId,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub available: bool,
    pub image_url: Option<String>,
    pub spice_levels: Vec<String>,
    pub oil_options: Vec<String>,
    pub min_quantity: Option<i32>,
    pub max_quantity: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Preparing,
    OutForDelivery,
    Delivered,
    Rejected,
    Cancelled,
}

/// Who is asking for an order transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Customer,
    Chef,
    Admin,
    /// Delivery completion reported by something outside this layer.
    System,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Rejected,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Rejected | OrderStatus::Cancelled
        )
    }

    /// Single-step edges of the order lifecycle, ignoring who asks.
    pub fn can_become(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Accepted) | (Pending, Rejected) => true,
            (Accepted, Preparing) => true,
            (Preparing, OutForDelivery) => true,
            (OutForDelivery, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Edge check plus the role gate on the target state.
    pub fn allows(&self, next: OrderStatus, actor: Actor) -> bool {
        use OrderStatus::*;
        let role_ok = match next {
            Pending => false,
            Accepted | Rejected | Preparing => actor == Actor::Chef,
            OutForDelivery => matches!(actor, Actor::Chef | Actor::Admin),
            Delivered => actor == Actor::System,
            Cancelled => matches!(actor, Actor::Customer | Actor::Admin),
        };
        role_ok && self.can_become(next)
    }
}

impl From<OrderStatus> for FilterValue {
    fn from(status: OrderStatus) -> Self {
        FilterValue::Text(status.as_str().to_string())
    }
}

impl From<VerificationStatus> for FilterValue {
    fn from(status: VerificationStatus) -> Self {
        FilterValue::Text(status.as_str().to_string())
    }
}

impl From<Role> for FilterValue {
    fn from(role: Role) -> Self {
        FilterValue::Text(role.as_str().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: OrderId,
    pub meal_id: MealId,
    pub customer_id: UserId,
    /// Chef's user id, matching `Meal.chef_id`.
    pub chef_id: UserId,
    pub quantity: i32,
    pub total_price: f64,
    pub status: OrderStatus,
    pub delivery_partner_id: Option<String>,
    pub delivery_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub meal_id: MealId,
    pub quantity: i32,
    pub price_per_unit: f64,
    pub subtotal: f64,
    pub spice_level: Option<String>,
    pub oil_preference: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: ReviewId,
    pub order_id: OrderId,
    pub customer_id: UserId,
    pub chef_id: ChefId,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Weekly,
    Monthly,
}

impl PlanType {
    pub fn days(&self) -> i64 {
        match self {
            PlanType::Weekly => 7,
            PlanType::Monthly => 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Paused,
    Cancelled,
    Completed,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub customer_id: UserId,
    pub chef_id: ChefId,
    pub plan_type: PlanType,
    pub meals_count: i32,
    pub meals_remaining: i32,
    pub price_per_meal: f64,
    pub total_price: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
}

macro_rules! record {
    ($ty:ty, $table:expr) => {
        impl Record for $ty {
            const TABLE: Table = $table;

            fn id(&self) -> uuid::Uuid {
                self.id.as_uuid()
            }
        }
    };
}

record!(Profile, Table::Profiles);
record!(RoleAssignment, Table::UserRoles);
record!(Chef, Table::Chefs);
record!(ChefSpecialty, Table::ChefSpecialties);
record!(Meal, Table::Meals);
record!(Order, Table::Orders);
record!(OrderItem, Table::OrderItems);
record!(Review, Table::Reviews);
record!(Subscription, Table::Subscriptions);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chef_drives_the_kitchen_steps() {
        assert!(OrderStatus::Pending.allows(OrderStatus::Accepted, Actor::Chef));
        assert!(OrderStatus::Pending.allows(OrderStatus::Rejected, Actor::Chef));
        assert!(OrderStatus::Accepted.allows(OrderStatus::Preparing, Actor::Chef));
        assert!(OrderStatus::Preparing.allows(OrderStatus::OutForDelivery, Actor::Chef));
        assert!(!OrderStatus::Pending.allows(OrderStatus::Preparing, Actor::Chef));
    }

    #[test]
    fn customers_cannot_accept_and_chefs_cannot_cancel() {
        assert!(!OrderStatus::Pending.allows(OrderStatus::Accepted, Actor::Customer));
        assert!(!OrderStatus::Pending.allows(OrderStatus::Cancelled, Actor::Chef));
        assert!(OrderStatus::Pending.allows(OrderStatus::Cancelled, Actor::Customer));
        assert!(OrderStatus::OutForDelivery.allows(OrderStatus::Cancelled, Actor::Admin));
    }

    #[test]
    fn admin_dispatches_but_only_system_delivers() {
        assert!(OrderStatus::Preparing.allows(OrderStatus::OutForDelivery, Actor::Admin));
        assert!(!OrderStatus::OutForDelivery.allows(OrderStatus::Delivered, Actor::Admin));
        assert!(!OrderStatus::OutForDelivery.allows(OrderStatus::Delivered, Actor::Chef));
        assert!(OrderStatus::OutForDelivery.allows(OrderStatus::Delivered, Actor::System));
    }

    #[test]
    fn terminal_states_go_nowhere() {
        for from in [OrderStatus::Delivered, OrderStatus::Rejected, OrderStatus::Cancelled] {
            for to in OrderStatus::ALL {
                for actor in [Actor::Customer, Actor::Chef, Actor::Admin, Actor::System] {
                    assert!(!from.allows(to, actor), "{from:?} -> {to:?} by {actor:?}");
                }
            }
        }
    }

    #[test]
    fn statuses_use_snake_case_on_the_wire() {
        let json = serde_json::to_value(OrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, serde_json::json!("out_for_delivery"));
        assert_eq!(OrderStatus::OutForDelivery.as_str(), "out_for_delivery");
    }
}
