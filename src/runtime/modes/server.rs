//! Server mode
//!
//! HTTP server 的装配和启动：路由挂载、CORS、压缩、request_id，
//! 以及优雅关闭。

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::{info, warn};
use url::Url;

use crate::api::middleware::RequestIdMiddleware;
use crate::api::services::{
    AppStartTime, admin::routes::admin_v1_routes, health_routes, public_routes,
};
use crate::config::CorsConfig;
use crate::runtime::lifetime;

/// 校验公开 base_url（引荐链接用它拼出来，配错了链接全废）
fn validate_base_url(base_url: &str) -> Result<()> {
    let parsed =
        Url::parse(base_url).with_context(|| format!("Invalid app.base_url: {}", base_url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        warn!(
            "app.base_url has scheme '{}', referral links may not be clickable",
            parsed.scheme()
        );
    }
    Ok(())
}

/// Validate CORS configuration at startup (runs once)
fn validate_cors_config(cors_config: &CorsConfig) {
    if !cors_config.enabled {
        return;
    }

    if cors_config.allowed_origins.is_empty() {
        warn!(
            "CORS enabled but allowed_origins is empty. \
            No cross-origin requests will be allowed. \
            Set allowed_origins explicitly or use '[\"*\"]' for any origin."
        );
    }
}

/// Build CORS middleware from configuration
fn build_cors_middleware(cors_config: &CorsConfig) -> Cors {
    // When CORS is disabled, use browser's default same-origin policy (restrictive)
    if !cors_config.enabled {
        return Cors::default();
    }

    let mut cors = Cors::default();

    let is_any_origin = cors_config.allowed_origins.iter().any(|o| o == "*");

    // Configure allowed origins
    if cors_config.allowed_origins.is_empty() {
        // Empty origins = same-origin only (no cross-origin requests allowed)
        // Don't call allow_any_origin(), use default same-origin policy
    } else if is_any_origin {
        cors = cors.allow_any_origin();
    } else {
        for origin in &cors_config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    // 公开报名接口只需要这几个方法和头
    cors = cors
        .allowed_methods(vec!["GET", "POST", "PUT"])
        .allowed_headers(vec!["Content-Type", "Accept"])
        .max_age(cors_config.max_age);

    cors
}

/// Run the HTTP server
///
/// 启动顺序：记录启动时间 -> 准备 storage / service / 路由前缀 ->
/// 起 HttpServer -> 等待退出信号。调用前必须先初始化日志。
pub async fn run_server() -> Result<()> {
    // Record application start time
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    // Prepare server startup (storage, view tracker, routes)
    let startup = lifetime::startup::prepare_server_startup()
        .await
        .map_err(|e| {
            tracing::error!("Server startup failed: {}", e);
            e
        })?;

    let storage = startup.storage.clone();
    let waitlist_service = startup.waitlist_service.clone();
    let route = startup.route_config.clone();

    let admin_prefix = route.admin_prefix;
    let health_prefix = route.health_prefix;

    let config = crate::config::get_config();

    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let cpu_count = config.server.cpu_count.min(32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let cors_config = config.cors.clone();

    // Validate configuration at startup (runs once, not per worker)
    validate_base_url(&config.app.base_url)?;
    validate_cors_config(&cors_config);

    // 限流取真实 IP 的代理模式，启动时提示一次
    if config.app.trusted_proxies.is_empty() {
        info!("Join rate limiting: no trusted proxies configured, using peer address directly");
    } else {
        warn!(
            "Join rate limiting: trusted proxies configured: {:?}",
            config.app.trusted_proxies
        );
    }

    // Configure HTTP server
    let server = HttpServer::new(move || {
        // Build CORS middleware
        let cors = build_cors_middleware(&cors_config);

        App::new()
            .wrap(RequestIdMiddleware) // 为每个请求生成 request_id
            .wrap(cors)
            .wrap(Compress::default())
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(waitlist_service.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .app_data(web::PayloadConfig::new(1024 * 1024))
            .wrap(
                DefaultHeaders::new()
                    .add(("Connection", "keep-alive"))
                    .add(("Keep-Alive", "timeout=30, max=1000"))
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .service(web::scope(&admin_prefix).service(admin_v1_routes()))
            .service(web::scope(&health_prefix).service(health_routes()))
            .service(web::scope("/api").service(public_routes()))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count);

    warn!("Starting server at http://{}", bind_address);
    let server = server.bind(bind_address)?.run();

    // Wait for server or shutdown signal
    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown() => {
            warn!("Graceful shutdown: all tasks completed");
        }
    }

    Ok(())
}
