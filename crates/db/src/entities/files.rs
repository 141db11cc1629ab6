//! `SeaORM` Entity for files table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub generated_name: String,
    pub path: String,
    pub original_path: String,
    pub folder_id: String,
    pub size: i64,
    pub file_type: String,
    pub storage_type: String,
    pub url: String,
    pub tenant_id: String,
    pub created_by: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub is_deleted: bool,
    pub deleted_by: Option<String>,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::file_shares::Entity")]
    FileShares,
}

impl Related<super::file_shares::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FileShares.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
