use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "project")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub status: String,
    pub deadline: Option<Date>,
    pub assignee_id: Option<i32>,
    /// Serialized `Vec<workhub_core::Step>`.
    pub steps: Json,
    pub version: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::task_index::Entity")]
    TaskIndex,
}

impl Related<super::task_index::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaskIndex.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
