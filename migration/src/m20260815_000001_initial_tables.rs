use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 waitlists 表
        manager
            .create_table(
                Table::create()
                    .table(Waitlist::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Waitlist::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Waitlist::Slug).string().not_null())
                    .col(ColumnDef::new(Waitlist::Name).string().not_null())
                    .col(
                        ColumnDef::new(Waitlist::EntrySeq)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Waitlist::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // slug 是公开落地页的查找键，必须唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_waitlists_slug")
                    .table(Waitlist::Table)
                    .col(Waitlist::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 创建 waitlist_entries 表
        manager
            .create_table(
                Table::create()
                    .table(WaitlistEntry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WaitlistEntry::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntry::WaitlistId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WaitlistEntry::Email).string().not_null())
                    .col(ColumnDef::new(WaitlistEntry::Name).string().null())
                    .col(
                        ColumnDef::new(WaitlistEntry::Position)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntry::ReferralCode)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntry::ReferralSource)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntry::Referrals)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntry::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(WaitlistEntry::CustomData).text().null())
                    .col(
                        ColumnDef::new(WaitlistEntry::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一 waitlist 内 email 唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_entries_waitlist_email")
                    .table(WaitlistEntry::Table)
                    .col(WaitlistEntry::WaitlistId)
                    .col(WaitlistEntry::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 同一 waitlist 内 position 唯一，兜底并发分配冲突
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_entries_waitlist_position")
                    .table(WaitlistEntry::Table)
                    .col(WaitlistEntry::WaitlistId)
                    .col(WaitlistEntry::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // referral_code 全局唯一，作为公开查找键
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_entries_referral_code")
                    .table(WaitlistEntry::Table)
                    .col(WaitlistEntry::ReferralCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 创建 waitlist_analytics 表（每个 waitlist 一行）
        manager
            .create_table(
                Table::create()
                    .table(WaitlistAnalytics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WaitlistAnalytics::WaitlistId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WaitlistAnalytics::Signups)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(WaitlistAnalytics::Views)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(WaitlistAnalytics::DailyStats).text().null())
                    .col(ColumnDef::new(WaitlistAnalytics::UtmData).text().null())
                    .col(
                        ColumnDef::new(WaitlistAnalytics::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除表（索引随表删除）
        manager
            .drop_table(Table::drop().table(WaitlistAnalytics::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_entries_referral_code").to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_entries_waitlist_position")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("idx_entries_waitlist_email").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(WaitlistEntry::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_waitlists_slug").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Waitlist::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Waitlist {
    #[sea_orm(iden = "waitlists")]
    Table,
    Id,
    Slug,
    Name,
    EntrySeq,
    CreatedAt,
}

#[derive(DeriveIden)]
enum WaitlistEntry {
    #[sea_orm(iden = "waitlist_entries")]
    Table,
    Id,
    WaitlistId,
    Email,
    Name,
    Position,
    ReferralCode,
    ReferralSource,
    Referrals,
    Status,
    CustomData,
    JoinedAt,
}

#[derive(DeriveIden)]
enum WaitlistAnalytics {
    #[sea_orm(iden = "waitlist_analytics")]
    Table,
    WaitlistId,
    Signups,
    Views,
    DailyStats,
    UtmData,
    UpdatedAt,
}
