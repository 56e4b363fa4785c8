use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    /// Chef-profile id.
    pub chef_id: Uuid,
    pub plan_type: String,
    pub meals_count: i32,
    pub meals_remaining: i32,
    pub price_per_meal: f64,
    pub total_price: f64,
    pub start_date: Date,
    pub end_date: Date,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::chefs::Entity",
        from = "Column::ChefId",
        to = "super::chefs::Column::Id"
    )]
    Chefs,
}

impl Related<super::chefs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chefs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
