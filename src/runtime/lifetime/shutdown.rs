use std::time::Duration;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::analytics::global::get_view_tracker;

/// 整体关闭预算（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// 单个清理任务的超时（秒）
const TASK_TIMEOUT_SECS: u64 = 10;

/// 等待 Ctrl+C，然后在预算内落盘缓冲数据
pub async fn listen_for_shutdown() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}. Shutting down anyway.", e);
    } else {
        info!("Shutdown signal received, flushing buffered data...");
    }

    let within_budget = timeout(
        Duration::from_secs(SHUTDOWN_TIMEOUT_SECS),
        flush_view_counts(),
    )
    .await;

    if within_budget.is_err() {
        error!(
            "Shutdown tasks exceeded {}s budget, forcing exit",
            SHUTDOWN_TIMEOUT_SECS
        );
        std::process::exit(1);
    }

    info!("Shutdown tasks completed");
}

/// 把 ViewTracker 里还没写库的浏览计数刷下去
async fn flush_view_counts() {
    let Some(tracker) = get_view_tracker() else {
        info!("ViewTracker not initialized, nothing to flush");
        return;
    };

    match timeout(Duration::from_secs(TASK_TIMEOUT_SECS), tracker.flush()).await {
        Ok(()) => info!("Buffered view counts flushed"),
        Err(_) => error!(
            "View count flush timed out after {} seconds",
            TASK_TIMEOUT_SECS
        ),
    }
}
