//! Mutation operations for SeaOrmStorage
//!
//! This module contains all write database operations.
//! join / add / import 的「占位 + 插入 + 计数」必须在同一事务内完成，
//! 位置分配依赖 waitlists.entry_seq 的原子自增。

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ColumnTrait, DatabaseTransaction, EntityTrait, ExprTrait, PaginatorTrait, QueryFilter,
    QuerySelect, SqlErr, TransactionTrait, sea_query::Expr,
};
use tracing::info;

use super::SeaOrmStorage;
use super::retry;
use crate::errors::{Result, WaitlisterError};
use crate::storage::models::{EntryStatus, Waitlist, WaitlistEntry};
use crate::utils::generate_referral_code;

use migration::entities::{waitlist, waitlist_analytics, waitlist_entry};

use super::converters::json_to_text;

/// 导入批次大小（去重查询和 insert_many 的粒度）
const IMPORT_BATCH_SIZE: usize = 100;

/// 引荐码冲突时的重新生成次数上限
const MAX_CODE_ATTEMPTS: u32 = 5;

/// 新条目草稿（join / 后台添加）
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub email: String,
    pub name: Option<String>,
    pub referral_source: Option<String>,
    pub status: EntryStatus,
    pub custom_data: Option<serde_json::Value>,
}

/// 批量导入的单行（email 已规范化）
#[derive(Debug, Clone)]
pub struct NewSignup {
    pub email: String,
    pub name: Option<String>,
}

/// 批量导入结果
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkInsertOutcome {
    pub created: usize,
    pub skipped: usize,
}

impl SeaOrmStorage {
    /// 创建 waitlist 并在同一事务内建立 analytics 行
    pub async fn create_waitlist(&self, name: &str, slug: &str) -> Result<Waitlist> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WaitlisterError::database_operation(format!("开始事务失败: {}", e)))?;

        // 先查重，唯一索引兜底并发竞争
        let existing = waitlist::Entity::find()
            .filter(waitlist::Column::Slug.eq(slug))
            .one(&txn)
            .await
            .map_err(|e| WaitlisterError::database_operation(format!("查询 slug 失败: {}", e)))?;
        if existing.is_some() {
            return Err(WaitlisterError::duplicate_slug(format!(
                "slug 已存在: {}",
                slug
            )));
        }

        let now = Utc::now();
        let insert_result = waitlist::Entity::insert(waitlist::ActiveModel {
            id: Default::default(),
            slug: Set(slug.to_string()),
            name: Set(name.to_string()),
            entry_seq: Set(0),
            created_at: Set(now),
        })
        .exec(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                WaitlisterError::duplicate_slug(format!("slug 已存在: {}", slug))
            }
            _ => WaitlisterError::database_operation(format!("创建 waitlist 失败: {}", e)),
        })?;
        let waitlist_id = insert_result.last_insert_id;

        waitlist_analytics::Entity::insert(waitlist_analytics::ActiveModel {
            waitlist_id: Set(waitlist_id),
            signups: Set(0),
            views: Set(0),
            daily_stats: Set(None),
            utm_data: Set(None),
            updated_at: Set(now),
        })
        .exec(&txn)
        .await
        .map_err(|e| WaitlisterError::database_operation(format!("创建统计行失败: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| WaitlisterError::database_operation(format!("提交事务失败: {}", e)))?;

        info!("Waitlist created: {} ({})", slug, waitlist_id);
        Ok(Waitlist {
            id: waitlist_id,
            slug: slug.to_string(),
            name: name.to_string(),
            entry_seq: 0,
            created_at: now,
        })
    }

    /// 插入单个条目（join / 后台添加共用）
    ///
    /// 事务内完成：序列占位、邮箱查重、引荐码生成、条目插入、
    /// signups 自增、引荐归因。返回条目和插入后的实时总数。
    pub async fn insert_entry(
        &self,
        waitlist_id: i64,
        draft: EntryDraft,
    ) -> Result<(WaitlistEntry, u64)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WaitlisterError::database_operation(format!("开始事务失败: {}", e)))?;

        // 占位：entry_seq + 1，同时拿到 waitlist 行锁序列化并发写入
        let position = claim_positions(&txn, waitlist_id, 1).await?;

        // 邮箱查重（唯一索引兜底）
        let duplicate = waitlist_entry::Entity::find()
            .filter(waitlist_entry::Column::WaitlistId.eq(waitlist_id))
            .filter(waitlist_entry::Column::Email.eq(draft.email.clone()))
            .one(&txn)
            .await
            .map_err(|e| WaitlisterError::database_operation(format!("查询邮箱失败: {}", e)))?;
        if duplicate.is_some() {
            return Err(WaitlisterError::duplicate_email(format!(
                "邮箱已存在: {}",
                draft.email
            )));
        }

        let referral_code = claim_referral_code(&txn).await?;

        // 引荐归因：referral_source 命中同一 waitlist 的引荐码时给引荐人 +1
        let referrer_id = match draft.referral_source.as_deref() {
            Some(source) if !source.is_empty() => waitlist_entry::Entity::find()
                .filter(waitlist_entry::Column::WaitlistId.eq(waitlist_id))
                .filter(waitlist_entry::Column::ReferralCode.eq(source))
                .one(&txn)
                .await
                .map_err(|e| {
                    WaitlisterError::database_operation(format!("查询引荐人失败: {}", e))
                })?
                .map(|m| m.id),
            _ => None,
        };

        let now = Utc::now();
        let insert_result = waitlist_entry::Entity::insert(waitlist_entry::ActiveModel {
            id: Default::default(),
            waitlist_id: Set(waitlist_id),
            email: Set(draft.email.clone()),
            name: Set(draft.name.clone()),
            position: Set(position),
            referral_code: Set(referral_code.clone()),
            referral_source: Set(draft.referral_source.clone()),
            referrals: Set(0),
            status: Set(draft.status.to_string()),
            custom_data: Set(json_to_text(draft.custom_data.as_ref())),
            joined_at: Set(now),
        })
        .exec(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                WaitlisterError::duplicate_email(format!("邮箱已存在: {}", draft.email))
            }
            _ => WaitlisterError::database_operation(format!("插入条目失败: {}", e)),
        })?;
        let entry_id = insert_result.last_insert_id;

        bump_signups(&txn, waitlist_id, 1).await?;

        if let Some(referrer_id) = referrer_id {
            waitlist_entry::Entity::update_many()
                .col_expr(
                    waitlist_entry::Column::Referrals,
                    Expr::col(waitlist_entry::Column::Referrals).add(1),
                )
                .filter(waitlist_entry::Column::Id.eq(referrer_id))
                .exec(&txn)
                .await
                .map_err(|e| {
                    WaitlisterError::database_operation(format!("更新引荐计数失败: {}", e))
                })?;
        }

        let total = waitlist_entry::Entity::find()
            .filter(waitlist_entry::Column::WaitlistId.eq(waitlist_id))
            .count(&txn)
            .await
            .map_err(|e| WaitlisterError::database_operation(format!("统计条目失败: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| WaitlisterError::database_operation(format!("提交事务失败: {}", e)))?;

        self.invalidate_count_cache();

        let entry = WaitlistEntry {
            id: entry_id,
            waitlist_id,
            email: draft.email,
            name: draft.name,
            position,
            referral_code,
            referral_source: draft.referral_source,
            referrals: 0,
            status: draft.status,
            custom_data: draft.custom_data,
            joined_at: now,
        };
        Ok((entry, total))
    }

    /// 批量导入条目（整体一个事务，全有或全无）
    ///
    /// 位置从当前 entry_seq 连续分配，重复邮箱跳过不占位。
    /// 导入行以 verified 状态落库。
    pub async fn bulk_insert_entries(
        &self,
        waitlist_id: i64,
        signups: Vec<NewSignup>,
    ) -> Result<BulkInsertOutcome> {
        if signups.is_empty() {
            return Ok(BulkInsertOutcome::default());
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WaitlisterError::database_operation(format!("开始事务失败: {}", e)))?;

        // 先按输入行数占满区间（同时锁住 waitlist 行），结尾归还未用的部分。
        // 持锁期间没有其他写入者，位置保证连续。
        let claimed_end = claim_positions(&txn, waitlist_id, signups.len() as i64).await?;
        let start_pos = claimed_end - signups.len() as i64;

        let mut seen: HashSet<String> = HashSet::new();
        let mut taken_codes: HashSet<String> = HashSet::new();
        let mut created: usize = 0;
        let mut skipped: usize = 0;
        let mut next_position = start_pos;
        let now = Utc::now();

        for chunk in signups.chunks(IMPORT_BATCH_SIZE) {
            let emails: Vec<String> = chunk.iter().map(|s| s.email.clone()).collect();
            let existing: HashSet<String> = waitlist_entry::Entity::find()
                .select_only()
                .column(waitlist_entry::Column::Email)
                .filter(waitlist_entry::Column::WaitlistId.eq(waitlist_id))
                .filter(waitlist_entry::Column::Email.is_in(emails))
                .into_tuple::<String>()
                .all(&txn)
                .await
                .map_err(|e| {
                    WaitlisterError::database_operation(format!("批量查重失败: {}", e))
                })?
                .into_iter()
                .collect();

            let fresh: Vec<&NewSignup> = chunk
                .iter()
                .filter(|s| {
                    if existing.contains(&s.email) || !seen.insert(s.email.clone()) {
                        skipped += 1;
                        false
                    } else {
                        true
                    }
                })
                .collect();

            if fresh.is_empty() {
                continue;
            }

            let codes = claim_referral_codes(&txn, fresh.len(), &mut taken_codes).await?;

            let models: Vec<waitlist_entry::ActiveModel> = fresh
                .iter()
                .zip(codes)
                .map(|(signup, code)| {
                    next_position += 1;
                    waitlist_entry::ActiveModel {
                        id: Default::default(),
                        waitlist_id: Set(waitlist_id),
                        email: Set(signup.email.clone()),
                        name: Set(signup.name.clone()),
                        position: Set(next_position),
                        referral_code: Set(code),
                        referral_source: Set(None),
                        referrals: Set(0),
                        status: Set(EntryStatus::Verified.to_string()),
                        custom_data: Set(None),
                        joined_at: Set(now),
                    }
                })
                .collect();

            created += models.len();
            waitlist_entry::Entity::insert_many(models)
                .exec(&txn)
                .await
                .map_err(|e| {
                    WaitlisterError::database_operation(format!("批量插入失败: {}", e))
                })?;
        }

        // 归还未使用的序列区间，保持 entry_seq == 最大 position
        let unused = signups.len() - created;
        if unused > 0 {
            waitlist::Entity::update_many()
                .col_expr(
                    waitlist::Column::EntrySeq,
                    Expr::col(waitlist::Column::EntrySeq).sub(unused as i64),
                )
                .filter(waitlist::Column::Id.eq(waitlist_id))
                .exec(&txn)
                .await
                .map_err(|e| {
                    WaitlisterError::database_operation(format!("回收序列失败: {}", e))
                })?;
        }

        if created > 0 {
            bump_signups(&txn, waitlist_id, created as i64).await?;
        }

        txn.commit()
            .await
            .map_err(|e| WaitlisterError::database_operation(format!("提交事务失败: {}", e)))?;

        self.invalidate_count_cache();
        info!(
            "Bulk import into waitlist {}: {} created, {} skipped",
            waitlist_id, created, skipped
        );
        Ok(BulkInsertOutcome { created, skipped })
    }

    /// 更新条目状态（只允许前进，同状态为 no-op）
    pub async fn update_entry_status(
        &self,
        waitlist_id: i64,
        entry_id: i64,
        new_status: EntryStatus,
    ) -> Result<WaitlistEntry> {
        let mut entry = self
            .find_entry(waitlist_id, entry_id)
            .await?
            .ok_or_else(|| WaitlisterError::not_found(format!("条目不存在: {}", entry_id)))?;

        if !entry.status.can_transition_to(new_status) {
            return Err(WaitlisterError::validation(format!(
                "不允许的状态变更: {} -> {}",
                entry.status, new_status
            )));
        }

        if entry.status == new_status {
            return Ok(entry);
        }

        let db = &self.db;
        let result = retry::with_retry(
            &format!("update_entry_status({})", entry_id),
            self.retry_config,
            || async {
                waitlist_entry::Entity::update_many()
                    .col_expr(
                        waitlist_entry::Column::Status,
                        Expr::value(new_status.to_string()),
                    )
                    .filter(waitlist_entry::Column::Id.eq(entry_id))
                    .filter(waitlist_entry::Column::WaitlistId.eq(waitlist_id))
                    .exec(db)
                    .await
            },
        )
        .await
        .map_err(|e| WaitlisterError::database_operation(format!("更新状态失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(WaitlisterError::not_found(format!(
                "条目不存在: {}",
                entry_id
            )));
        }

        entry.status = new_status;
        Ok(entry)
    }
}

/// 原子占位：entry_seq += n 并读回，返回占位后的序列值。
/// UPDATE 持有 waitlist 行锁直到事务结束，并发写入者在此串行化。
async fn claim_positions(txn: &DatabaseTransaction, waitlist_id: i64, n: i64) -> Result<i64> {
    let result = waitlist::Entity::update_many()
        .col_expr(
            waitlist::Column::EntrySeq,
            Expr::col(waitlist::Column::EntrySeq).add(n),
        )
        .filter(waitlist::Column::Id.eq(waitlist_id))
        .exec(txn)
        .await
        .map_err(|e| WaitlisterError::database_operation(format!("序列占位失败: {}", e)))?;

    if result.rows_affected == 0 {
        return Err(WaitlisterError::not_found(format!(
            "waitlist 不存在: {}",
            waitlist_id
        )));
    }

    let model = waitlist::Entity::find_by_id(waitlist_id)
        .one(txn)
        .await
        .map_err(|e| WaitlisterError::database_operation(format!("读取序列失败: {}", e)))?
        .ok_or_else(|| WaitlisterError::database_operation("序列行读取为空".to_string()))?;

    Ok(model.entry_seq)
}

/// signups += delta
async fn bump_signups(txn: &DatabaseTransaction, waitlist_id: i64, delta: i64) -> Result<()> {
    waitlist_analytics::Entity::update_many()
        .col_expr(
            waitlist_analytics::Column::Signups,
            Expr::col(waitlist_analytics::Column::Signups).add(delta),
        )
        .col_expr(waitlist_analytics::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(waitlist_analytics::Column::WaitlistId.eq(waitlist_id))
        .exec(txn)
        .await
        .map_err(|e| WaitlisterError::database_operation(format!("更新报名计数失败: {}", e)))?;
    Ok(())
}

/// 生成一个全局未占用的引荐码（有限次重试）
async fn claim_referral_code(txn: &DatabaseTransaction) -> Result<String> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_referral_code();
        let hit = waitlist_entry::Entity::find()
            .filter(waitlist_entry::Column::ReferralCode.eq(code.clone()))
            .one(txn)
            .await
            .map_err(|e| WaitlisterError::database_operation(format!("查询引荐码失败: {}", e)))?;
        if hit.is_none() {
            return Ok(code);
        }
    }
    Err(WaitlisterError::database_operation(
        "引荐码生成冲突次数过多".to_string(),
    ))
}

/// 批量生成全局未占用的引荐码（每批一次 is_in 查重）
async fn claim_referral_codes(
    txn: &DatabaseTransaction,
    n: usize,
    taken: &mut HashSet<String>,
) -> Result<Vec<String>> {
    let mut codes: Vec<String> = Vec::with_capacity(n);
    while codes.len() < n {
        let code = generate_referral_code();
        if taken.insert(code.clone()) {
            codes.push(code);
        }
    }

    for _ in 0..MAX_CODE_ATTEMPTS {
        let hits: HashSet<String> = waitlist_entry::Entity::find()
            .select_only()
            .column(waitlist_entry::Column::ReferralCode)
            .filter(waitlist_entry::Column::ReferralCode.is_in(codes.clone()))
            .into_tuple::<String>()
            .all(txn)
            .await
            .map_err(|e| WaitlisterError::database_operation(format!("查询引荐码失败: {}", e)))?
            .into_iter()
            .collect();

        if hits.is_empty() {
            return Ok(codes);
        }

        for code in codes.iter_mut() {
            if hits.contains(code) {
                taken.remove(code);
                let mut fresh = generate_referral_code();
                while !taken.insert(fresh.clone()) {
                    fresh = generate_referral_code();
                }
                *code = fresh;
            }
        }
    }

    Err(WaitlisterError::database_operation(
        "引荐码生成冲突次数过多".to_string(),
    ))
}
