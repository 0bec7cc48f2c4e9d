use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product row; detail lines are embedded as a JSON array.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Display id, `P<n>`
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub company_id: String,
    #[sea_orm(column_type = "Json")]
    pub details: Json,
    pub total_quantity: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
