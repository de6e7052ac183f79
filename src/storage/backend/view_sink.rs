//! 浏览计数落库
//!
//! ViewTracker 定期把内存里攒下的 (waitlist_id, 次数) 增量交给这里，
//! 用一条 CASE WHEN 的 UPDATE 批量累加进 waitlist_analytics，
//! 三种数据库方言通用。

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{CaseStatement, Expr, Query};
use sea_orm::{ConnectionTrait, ExprTrait};
use tracing::debug;

use super::SeaOrmStorage;
use super::retry;
use crate::analytics::ViewSink;

use migration::entities::waitlist_analytics;

#[async_trait]
impl ViewSink for SeaOrmStorage {
    async fn flush_views(&self, updates: Vec<(i64, usize)>) -> anyhow::Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let targets: Vec<i64> = updates.iter().map(|(id, _)| *id).collect();

        // views = CASE WHEN waitlist_id = ? THEN views + n ... ELSE views END
        let mut bump = CaseStatement::new();
        for (waitlist_id, count) in &updates {
            bump = bump.case(
                Expr::col(waitlist_analytics::Column::WaitlistId).eq(Expr::val(*waitlist_id)),
                Expr::col(waitlist_analytics::Column::Views).add(Expr::val(*count as i64)),
            );
        }
        let bump = bump.finally(Expr::col(waitlist_analytics::Column::Views));

        let stmt = Query::update()
            .table(waitlist_analytics::Entity)
            .value(waitlist_analytics::Column::Views, bump)
            .value(waitlist_analytics::Column::UpdatedAt, Expr::val(Utc::now()))
            .and_where(Expr::col(waitlist_analytics::Column::WaitlistId).is_in(targets))
            .to_owned();

        // 语句由 SeaORM build 成带绑定参数的形式，锁冲突走统一的重试逻辑
        let db = &self.db;
        let stmt_ref = &stmt;
        retry::with_retry("flush_views", self.retry_config, || async {
            db.execute(stmt_ref).await
        })
        .await
        .map_err(|e| anyhow::anyhow!("View count flush gave up after retries: {}", e))?;

        debug!(
            "Flushed buffered views for {} waitlists to {}",
            updates.len(),
            self.backend_name
        );

        Ok(())
    }
}
