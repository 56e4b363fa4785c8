use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chef_specialties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub chef_id: Uuid,
    pub specialty: String,
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
