//! Admin API 路由配置
//!
//! 将 /v1 下的路由按功能模块拆分，提高可读性和可维护性。

use actix_web::web;

use super::export_import::{export_signups, import_signups};
use super::subscriber_ops::{get_subscribers, post_subscriber, promote_subscriber};
use super::waitlist_ops::{get_all_waitlists, get_waitlist_detail, post_waitlist};

/// waitlist 管理路由 `/waitlists`
///
/// 包含：
/// - GET/HEAD /waitlists - 获取所有 waitlist
/// - POST /waitlists - 创建 waitlist
/// - GET/HEAD /waitlists/{id} - 获取单个 waitlist 详情
/// - GET /waitlists/{id}/subscribers - 分页获取报名条目
/// - POST /waitlists/{id}/subscribers - 后台直接添加条目
/// - PUT /waitlists/{id}/subscribers/{entry_id}/status - 推进条目状态
/// - POST /waitlists/{id}/signups/import - CSV 导入
/// - GET /waitlists/{id}/signups/export - CSV 流式导出
pub fn waitlists_routes() -> actix_web::Scope {
    web::scope("/waitlists")
        .route("", web::get().to(get_all_waitlists))
        .route("", web::head().to(get_all_waitlists))
        .route("", web::post().to(post_waitlist))
        // Import/Export operations (keep above the single-resource routes)
        .route("/{id}/signups/import", web::post().to(import_signups))
        .route("/{id}/signups/export", web::get().to(export_signups))
        // Subscriber management
        .route("/{id}/subscribers", web::get().to(get_subscribers))
        .route("/{id}/subscribers", web::post().to(post_subscriber))
        .route(
            "/{id}/subscribers/{entry_id}/status",
            web::put().to(promote_subscriber),
        )
        // Single waitlist operations
        .route("/{id}", web::get().to(get_waitlist_detail))
        .route("/{id}", web::head().to(get_waitlist_detail))
}

/// Admin API v1 路由
///
/// 组合所有子模块路由
pub fn admin_v1_routes() -> actix_web::Scope {
    web::scope("/v1").service(waitlists_routes())
}
