//! Query operations for SeaOrmStorage
//!
//! This module contains all read-only database operations.

use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use tracing::debug;

use super::{SeaOrmStorage, retry};
use crate::errors::Result;
use crate::storage::models::{Waitlist, WaitlistAnalytics, WaitlistEntry};

use migration::entities::{waitlist, waitlist_analytics, waitlist_entry};

use super::converters::{model_to_analytics, model_to_entry, model_to_waitlist};

/// 按 waitlist 分组的计数查询结果（DSL 聚合查询）
#[derive(Debug, FromQueryResult)]
struct EntryCountRow {
    waitlist_id: i64,
    entry_count: i64,
}

impl SeaOrmStorage {
    pub async fn get_waitlist(&self, id: i64) -> Result<Option<Waitlist>> {
        let db = &self.db;

        let model = retry::with_retry(
            &format!("get_waitlist({})", id),
            self.retry_config,
            || async { waitlist::Entity::find_by_id(id).one(db).await },
        )
        .await?;

        Ok(model.map(model_to_waitlist))
    }

    pub async fn get_waitlist_by_slug(&self, slug: &str) -> Result<Option<Waitlist>> {
        let db = &self.db;
        let slug_owned = slug.to_string();

        let model = retry::with_retry(
            &format!("get_waitlist_by_slug({})", slug),
            self.retry_config,
            || async {
                waitlist::Entity::find()
                    .filter(waitlist::Column::Slug.eq(slug_owned.clone()))
                    .one(db)
                    .await
            },
        )
        .await?;

        Ok(model.map(model_to_waitlist))
    }

    /// 分页加载 waitlist（创建时间倒序）
    pub async fn load_waitlists_page(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Waitlist>, u64)> {
        let db = &self.db;

        let total = retry::with_retry("load_waitlists_page(count)", self.retry_config, || async {
            waitlist::Entity::find().count(db).await
        })
        .await?;

        let page_offset = page.saturating_sub(1);
        let models = retry::with_retry("load_waitlists_page(data)", self.retry_config, || async {
            waitlist::Entity::find()
                .order_by_desc(waitlist::Column::CreatedAt)
                .paginate(db, page_size)
                .fetch_page(page_offset)
                .await
        })
        .await?;

        Ok((models.into_iter().map(model_to_waitlist).collect(), total))
    }

    /// waitlist 总数，健康检查的存储探针
    pub async fn count_waitlists(&self) -> Result<u64> {
        let db = &self.db;

        let count = retry::with_retry("count_waitlists", self.retry_config, || async {
            waitlist::Entity::find().count(db).await
        })
        .await?;

        Ok(count)
    }

    /// 按 (waitlist, email) 查找条目，email 必须已规范化
    pub async fn find_entry_by_email(
        &self,
        waitlist_id: i64,
        email: &str,
    ) -> Result<Option<WaitlistEntry>> {
        let db = &self.db;
        let email_owned = email.to_string();

        let model = retry::with_retry(
            &format!("find_entry_by_email({})", waitlist_id),
            self.retry_config,
            || async {
                waitlist_entry::Entity::find()
                    .filter(waitlist_entry::Column::WaitlistId.eq(waitlist_id))
                    .filter(waitlist_entry::Column::Email.eq(email_owned.clone()))
                    .one(db)
                    .await
            },
        )
        .await?;

        Ok(model.map(model_to_entry))
    }

    /// 按主键查找条目，waitlist 不匹配时视为不存在
    pub async fn find_entry(
        &self,
        waitlist_id: i64,
        entry_id: i64,
    ) -> Result<Option<WaitlistEntry>> {
        let db = &self.db;

        let model = retry::with_retry(
            &format!("find_entry({})", entry_id),
            self.retry_config,
            || async {
                waitlist_entry::Entity::find_by_id(entry_id)
                    .filter(waitlist_entry::Column::WaitlistId.eq(waitlist_id))
                    .one(db)
                    .await
            },
        )
        .await?;

        Ok(model.map(model_to_entry))
    }

    /// 实时条目计数（join/status/详情页使用，不走缓存）
    pub async fn count_entries(&self, waitlist_id: i64) -> Result<u64> {
        let db = &self.db;

        let count = retry::with_retry(
            &format!("count_entries({})", waitlist_id),
            self.retry_config,
            || async {
                waitlist_entry::Entity::find()
                    .filter(waitlist_entry::Column::WaitlistId.eq(waitlist_id))
                    .count(db)
                    .await
            },
        )
        .await?;

        Ok(count)
    }

    /// 批量获取各 waitlist 的条目计数（带 30 秒缓存，仅后台概览使用）
    pub async fn count_entries_grouped(&self, waitlist_ids: &[i64]) -> Result<HashMap<i64, u64>> {
        let mut counts: HashMap<i64, u64> = HashMap::new();
        let mut misses: Vec<i64> = Vec::new();

        for &id in waitlist_ids {
            if let Some(cached) = self.count_cache.get(&id) {
                debug!("count cache hit: waitlist={}, value={}", id, cached);
                counts.insert(id, cached);
            } else {
                misses.push(id);
            }
        }

        if misses.is_empty() {
            return Ok(counts);
        }

        let db = &self.db;
        let miss_ids = misses.clone();
        let rows = retry::with_retry("count_entries_grouped", self.retry_config, || async {
            waitlist_entry::Entity::find()
                .select_only()
                .column(waitlist_entry::Column::WaitlistId)
                .column_as(waitlist_entry::Column::Id.count(), "entry_count")
                .filter(waitlist_entry::Column::WaitlistId.is_in(miss_ids.clone()))
                .group_by(waitlist_entry::Column::WaitlistId)
                .into_model::<EntryCountRow>()
                .all(db)
                .await
        })
        .await?;

        let mut grouped: HashMap<i64, u64> = rows
            .into_iter()
            .map(|row| (row.waitlist_id, row.entry_count.max(0) as u64))
            .collect();

        // 没有任何条目的 waitlist 不会出现在 GROUP BY 结果中，补 0
        for id in misses {
            let count = grouped.remove(&id).unwrap_or(0);
            self.count_cache.insert(id, count);
            counts.insert(id, count);
        }

        Ok(counts)
    }

    /// 分页加载条目（position 升序，总数实时）
    pub async fn load_entries_page(
        &self,
        waitlist_id: i64,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<WaitlistEntry>, u64)> {
        let total = self.count_entries(waitlist_id).await?;

        let db = &self.db;
        let page_offset = page.saturating_sub(1);
        let models = retry::with_retry("load_entries_page(data)", self.retry_config, || async {
            waitlist_entry::Entity::find()
                .filter(waitlist_entry::Column::WaitlistId.eq(waitlist_id))
                .order_by_asc(waitlist_entry::Column::Position)
                .paginate(db, page_size)
                .fetch_page(page_offset)
                .await
        })
        .await?;

        Ok((models.into_iter().map(model_to_entry).collect(), total))
    }

    /// 按偏移量加载一段条目（position 升序，导出流使用）
    pub async fn load_entries_chunk(
        &self,
        waitlist_id: i64,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<WaitlistEntry>> {
        let db = &self.db;

        let models = retry::with_retry("load_entries_chunk", self.retry_config, || async {
            waitlist_entry::Entity::find()
                .filter(waitlist_entry::Column::WaitlistId.eq(waitlist_id))
                .order_by_asc(waitlist_entry::Column::Position)
                .offset(offset)
                .limit(limit)
                .all(db)
                .await
        })
        .await?;

        Ok(models.into_iter().map(model_to_entry).collect())
    }

    pub async fn get_analytics(&self, waitlist_id: i64) -> Result<Option<WaitlistAnalytics>> {
        let db = &self.db;

        let model = retry::with_retry(
            &format!("get_analytics({})", waitlist_id),
            self.retry_config,
            || async {
                waitlist_analytics::Entity::find_by_id(waitlist_id)
                    .one(db)
                    .await
            },
        )
        .await?;

        Ok(model.map(model_to_analytics))
    }
}
