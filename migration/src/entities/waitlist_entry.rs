use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "waitlist_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub waitlist_id: i64,
    pub email: String,
    pub name: Option<String>,
    /// 1-based，同一 waitlist 内唯一
    pub position: i64,
    pub referral_code: String,
    pub referral_source: Option<String>,
    pub referrals: i64,
    pub status: String,
    /// 调用方自带的 JSON 负载，原样存取
    #[sea_orm(column_type = "Text", nullable)]
    pub custom_data: Option<String>,
    pub joined_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
