//! Admin API waitlist 管理操作

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::{error, info, trace};

use crate::errors::WaitlisterError;
use crate::services::{CreateWaitlistRequest, WaitlistService};

use super::error_code::ErrorCode;
use super::helpers::{created_response, error_from_waitlister, error_response, success_response};
use super::types::{
    PageQuery, PaginatedResponse, PaginationInfo, PostNewWaitlist, WaitlistDetailResponse,
    WaitlistOverviewResponse, WaitlistResponse,
};

/// 创建 waitlist
pub async fn post_waitlist(
    _req: HttpRequest,
    payload: web::Json<PostNewWaitlist>,
    service: web::Data<Arc<WaitlistService>>,
) -> ActixResult<impl Responder> {
    let payload = payload.into_inner();
    info!(
        "Admin API: create waitlist request - name: {}, slug: {:?}",
        payload.name, payload.slug
    );

    let request = CreateWaitlistRequest {
        name: payload.name,
        slug: payload.slug,
    };

    match service.create_waitlist(request).await {
        Ok(waitlist) => {
            info!(
                "Admin API: waitlist created - id: {}, slug: {}",
                waitlist.id, waitlist.slug
            );
            Ok(created_response(WaitlistResponse::from(waitlist)))
        }
        Err(e) => {
            error!("Admin API: failed to create waitlist: {}", e);
            Ok(error_from_waitlister(&e))
        }
    }
}

/// 获取所有 waitlist（分页，含条目计数）
pub async fn get_all_waitlists(
    _req: HttpRequest,
    query: web::Query<PageQuery>,
    service: web::Data<Arc<WaitlistService>>,
) -> ActixResult<impl Responder> {
    trace!("Admin API: request to list waitlists: {:?}", query);

    let (overviews, total, page, limit) =
        match service.list_waitlists(query.page, query.limit).await {
            Ok(result) => result,
            Err(e) => {
                error!("Admin API: failed to list waitlists: {}", e);
                return Ok(error_from_waitlister(&e));
            }
        };

    let items: Vec<WaitlistOverviewResponse> = overviews
        .into_iter()
        .map(WaitlistOverviewResponse::from)
        .collect();

    info!(
        "Admin API: returning {} waitlists (page {}, total: {})",
        items.len(),
        page,
        total
    );

    Ok(HttpResponse::Ok()
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(PaginatedResponse {
            code: ErrorCode::Success as i32,
            message: "OK".to_string(),
            data: items,
            pagination: PaginationInfo::new(total, page, limit),
        }))
}

/// 获取单个 waitlist 详情（含 analytics 与实时条目计数）
pub async fn get_waitlist_detail(
    _req: HttpRequest,
    path: web::Path<i64>,
    service: web::Data<Arc<WaitlistService>>,
) -> ActixResult<impl Responder> {
    let waitlist_id = path.into_inner();
    info!("Admin API: get waitlist request - id: {}", waitlist_id);

    match service.get_waitlist(waitlist_id).await {
        Ok(detail) => Ok(success_response(WaitlistDetailResponse::from(detail))),
        Err(e @ WaitlisterError::NotFound(_)) => {
            info!("Admin API: waitlist not found - {}", waitlist_id);
            Ok(error_response(
                StatusCode::NOT_FOUND,
                ErrorCode::WaitlistNotFound,
                e.message(),
            ))
        }
        Err(e) => {
            error!(
                "Admin API: failed to load waitlist {} - {}",
                waitlist_id, e
            );
            Ok(error_from_waitlister(&e))
        }
    }
}
