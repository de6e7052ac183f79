//! 数据库操作重试模块
//!
//! 写入竞争（同一 waitlist 的并发 join / import）在 SQLite 下表现为
//! database is locked，在 MySQL/PG 下表现为死锁或序列化失败。这类错误
//! 都是瞬时的，统一在这里用指数退避重试，调用方不感知。

use sea_orm::DbErr;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// 重试配置，来自 `[database]` 配置段
#[derive(Clone, Copy, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// 对单个数据库操作做带退避的重试
///
/// 只有 [`is_retryable_error`] 认定的瞬时错误会触发重试，
/// 其余错误原样返回。`operation_name` 仅用于日志。
pub async fn with_retry<T, F, Fut>(
    operation_name: &str,
    config: RetryConfig,
    mut operation: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt = 0;
    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(
                        "'{}' recovered after {} retries",
                        operation_name, attempt
                    );
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !is_retryable_error(&err) || attempt >= config.max_retries {
            if attempt > 0 {
                warn!(
                    "'{}' gave up after {} retries: {}",
                    operation_name, attempt, err
                );
            }
            return Err(err);
        }

        attempt += 1;
        let delay = backoff_with_jitter(attempt, config.base_delay_ms, config.max_delay_ms);
        warn!(
            "'{}' hit transient error (attempt {}/{}): {}; retrying in {} ms",
            operation_name,
            attempt,
            config.max_retries + 1,
            err,
            delay
        );
        sleep(Duration::from_millis(delay)).await;
    }
}

/// 判断数据库错误是否为可重试的瞬时错误
pub fn is_retryable_error(err: &DbErr) -> bool {
    match err {
        // 连接池取不到连接 / 连接断开
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(runtime_err) | DbErr::Query(runtime_err) => {
            runtime_error_is_transient(runtime_err)
        }
        _ => false,
    }
}

/// 数据库侧的竞争类错误码
const CONTENTION_CODES: &[&str] = &[
    "1213", "1205", // MySQL: deadlock / lock wait timeout
    "40001", "40P01", // PostgreSQL: serialization failure / deadlock
    "5", "6", // SQLite: BUSY / LOCKED
];

fn runtime_error_is_transient(err: &sea_orm::error::RuntimeErr) -> bool {
    use sea_orm::error::RuntimeErr;

    match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            use std::ops::Deref;
            if let Some(db_err) = sqlx_err.deref().as_database_error()
                && let Some(code) = db_err.code()
            {
                return CONTENTION_CODES.contains(&code.as_ref());
            }
            // 没有错误码时退化为消息匹配
            message_hints_contention(&sqlx_err.to_string())
        }
        RuntimeErr::Internal(msg) => message_hints_contention(msg),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

fn message_hints_contention(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    msg.contains("deadlock")
        || msg.contains("lock wait timeout")
        || msg.contains("database is locked")
        || msg.contains("serialization failure")
}

/// 指数退避 + 0-25% 随机抖动
fn backoff_with_jitter(attempt: u32, base_ms: u64, max_ms: u64) -> u64 {
    use rand::RngExt;
    let exp_delay = base_ms.saturating_mul(2u64.saturating_pow(attempt - 1));
    let capped = exp_delay.min(max_ms);
    let jitter = rand::rng().random_range(0..=capped / 4);
    capped.saturating_add(jitter)
}
