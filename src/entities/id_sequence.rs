use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Highest numeric suffix ever allocated per display-id prefix. Rows are only
/// raised, never lowered, so deleting the newest company or product does not
/// free its id.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "id_sequences")]
pub struct Model {
    /// `C` or `P`
    #[sea_orm(primary_key, auto_increment = false)]
    pub prefix: String,
    pub high_water: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
