//! Report category entity.
//!
//! Categories are seeded reference data; end users never create them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category model.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    /// Display name, e.g. "Pothole".
    pub name: String,
    /// Icon key for the frontend icon set.
    pub icon: String,
    /// Display color as a hex string.
    pub color: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::report::Entity")]
    Report,
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Report.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
