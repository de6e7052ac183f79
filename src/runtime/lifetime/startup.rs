use crate::analytics::global::set_global_view_tracker;
use crate::analytics::manager::ViewTracker;
use crate::services::WaitlistService;
use crate::storage::{SeaOrmStorage, StorageFactory};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub waitlist_service: Arc<WaitlistService>,
    pub route_config: RouteConfig,
}

#[derive(Clone, Debug)]
pub struct RouteConfig {
    pub admin_prefix: String,
    pub health_prefix: String,
}

/// 准备服务器启动的上下文
/// 包括存储、浏览计数器和路由配置等
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let config = crate::config::get_config();

    // 初始化浏览计数器（落地页 view 缓冲）
    let flush_interval = config.analytics.view_flush_interval_secs;
    let max_views_before_flush = config.analytics.max_views_before_flush;

    if let Some(sink) = storage.as_view_sink() {
        let mgr = Arc::new(ViewTracker::new(
            sink,
            Duration::from_secs(flush_interval),
            max_views_before_flush,
        ));

        set_global_view_tracker(mgr.clone());

        // 启动后台任务，并保持强引用以确保任务不会被过早销毁
        let mgr_for_task = mgr.clone();
        tokio::spawn(async move {
            mgr_for_task.start_background_task().await;
        });

        debug!(
            "ViewTracker initialized with {} seconds and {} max views before flush",
            flush_interval, max_views_before_flush
        );
    } else {
        warn!("View sink is not available, ViewTracker will not be initialized");
    }

    // Create WaitlistService for ranking and signup management
    let waitlist_service = Arc::new(WaitlistService::new(storage.clone()));

    // 提取路由配置
    let route_config = RouteConfig {
        admin_prefix: config.app.admin_route_prefix.clone(),
        health_prefix: config.app.health_route_prefix.clone(),
    };

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        storage,
        waitlist_service,
        route_config,
    })
}
