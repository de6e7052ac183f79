//! 每个 waitlist 一行的聚合计数

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "waitlist_analytics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub waitlist_id: i64,
    pub signups: i64,
    pub views: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub daily_stats: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub utm_data: Option<String>,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
