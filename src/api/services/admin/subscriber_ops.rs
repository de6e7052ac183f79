//! Admin API 报名条目管理操作

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::{error, info, trace};

use crate::errors::WaitlisterError;
use crate::services::{AddSubscriberRequest, WaitlistService};

use super::error_code::ErrorCode;
use super::helpers::{created_response, error_from_waitlister, error_response, success_response};
use super::types::{
    AddSubscriberPayload, EntryResponse, PageQuery, PaginatedResponse, PaginationInfo,
    PromotePayload,
};

/// 获取 waitlist 的报名条目（按 position 升序分页）
pub async fn get_subscribers(
    _req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<PageQuery>,
    service: web::Data<Arc<WaitlistService>>,
) -> ActixResult<impl Responder> {
    let waitlist_id = path.into_inner();
    trace!(
        "Admin API: request to list subscribers of waitlist {}: {:?}",
        waitlist_id, query
    );

    let (entries, total, page, limit) = match service
        .list_signups(waitlist_id, query.page, query.limit)
        .await
    {
        Ok(result) => result,
        Err(e @ WaitlisterError::NotFound(_)) => {
            info!("Admin API: waitlist not found - {}", waitlist_id);
            return Ok(error_response(
                StatusCode::NOT_FOUND,
                ErrorCode::WaitlistNotFound,
                e.message(),
            ));
        }
        Err(e) => {
            error!(
                "Admin API: failed to list subscribers of waitlist {} - {}",
                waitlist_id, e
            );
            return Ok(error_from_waitlister(&e));
        }
    };

    let items: Vec<EntryResponse> = entries.into_iter().map(EntryResponse::from).collect();

    info!(
        "Admin API: returning {} subscribers (waitlist {}, page {}, total: {})",
        items.len(),
        waitlist_id,
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

/// 后台直接添加报名条目（状态为 verified，不走公开表单）
pub async fn post_subscriber(
    _req: HttpRequest,
    path: web::Path<i64>,
    payload: web::Json<AddSubscriberPayload>,
    service: web::Data<Arc<WaitlistService>>,
) -> ActixResult<impl Responder> {
    let waitlist_id = path.into_inner();
    let payload = payload.into_inner();
    info!(
        "Admin API: add subscriber request - waitlist: {}, email: {}",
        waitlist_id, payload.email
    );

    let request = AddSubscriberRequest {
        email: payload.email,
        name: payload.name,
        custom_data: payload.custom_data,
    };

    match service.add_subscriber(waitlist_id, request).await {
        Ok(entry) => {
            info!(
                "Admin API: subscriber added - entry {} at position {} (waitlist {})",
                entry.id, entry.position, waitlist_id
            );
            Ok(created_response(EntryResponse::from(entry)))
        }
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
                "Admin API: failed to add subscriber to waitlist {} - {}",
                waitlist_id, e
            );
            // DuplicateEmail 在后台路径保持 409
            Ok(error_from_waitlister(&e))
        }
    }
}

/// 推进报名条目状态（只允许前向迁移）
pub async fn promote_subscriber(
    _req: HttpRequest,
    path: web::Path<(i64, i64)>,
    payload: web::Json<PromotePayload>,
    service: web::Data<Arc<WaitlistService>>,
) -> ActixResult<impl Responder> {
    let (waitlist_id, entry_id) = path.into_inner();
    info!(
        "Admin API: status change request - waitlist: {}, entry: {}, status: {}",
        waitlist_id, entry_id, payload.status
    );

    match service
        .promote_subscriber(waitlist_id, entry_id, &payload.status)
        .await
    {
        Ok(entry) => Ok(success_response(EntryResponse::from(entry))),
        Err(e @ WaitlisterError::Validation(_)) => {
            info!(
                "Admin API: rejected status change for entry {} - {}",
                entry_id,
                e.message()
            );
            Ok(error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidStatusChange,
                e.message(),
            ))
        }
        Err(e @ WaitlisterError::NotFound(_)) => {
            info!(
                "Admin API: entry not found - {} (waitlist {})",
                entry_id, waitlist_id
            );
            Ok(error_response(
                StatusCode::NOT_FOUND,
                ErrorCode::EntryNotFound,
                e.message(),
            ))
        }
        Err(e) => {
            error!(
                "Admin API: failed to update entry {} status - {}",
                entry_id, e
            );
            Ok(error_from_waitlister(&e))
        }
    }
}
