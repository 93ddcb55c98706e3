use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "employee")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub role: String,
    pub team_leader_id: Option<i32>,
    /// Cached presence, rewritten on every punch transition.
    pub presence: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::punch_record::Entity")]
    PunchRecord,
}

impl Related<super::punch_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PunchRecord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
