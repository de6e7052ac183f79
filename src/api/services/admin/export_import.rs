//! Admin API 导出导入操作

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Responder, Result as ActixResult, web};
use bytes::Bytes;
use csv::ReaderBuilder;
use futures_util::stream::{self, StreamExt};
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::services::{ImportSignupRaw, WaitlistService};
use crate::utils::csv_handler::{CsvSignupRow, export_entries_csv, generate_export_filename};

use super::error_code::ErrorCode;
use super::helpers::{error_from_waitlister, error_response, success_response};
use super::types::{FailedRowResponse, ImportResultResponse};

/// 每批次从存储取回并序列化的条目数量
const EXPORT_BATCH_SIZE: u64 = 2000;

/// 最大导入文件大小 (10MB)
const MAX_IMPORT_FILE_SIZE: usize = 10 * 1024 * 1024;

/// 导出报名条目为 CSV（流式响应）
///
/// 注意：此 handler 通过 service.export_chunk() 按 position 顺序翻页，
/// 不一次性加载全表。每批的 CSV 序列化在 blocking 线程池完成。
pub async fn export_signups(
    _req: HttpRequest,
    path: web::Path<i64>,
    service: web::Data<Arc<WaitlistService>>,
) -> ActixResult<impl Responder> {
    let waitlist_id = path.into_inner();
    info!(
        "Admin API: export signups (streaming) for waitlist {}",
        waitlist_id
    );

    // 404 必须在流式响应开始前返回
    let waitlist = match service.require_waitlist(waitlist_id).await {
        Ok(waitlist) => waitlist,
        Err(e) => {
            info!("Admin API: export rejected - {}", e.message());
            return Ok(error_from_waitlister(&e));
        }
    };

    let svc = service.get_ref().clone();

    // state: (offset, 是否第一批, 是否已终止)
    let csv_stream = stream::unfold(
        (0u64, true, false),
        move |(offset, first, done)| {
            let svc = svc.clone();
            async move {
                if done {
                    return None;
                }

                let batch = match svc
                    .export_chunk(waitlist_id, offset, EXPORT_BATCH_SIZE)
                    .await
                {
                    Ok(batch) => batch,
                    Err(e) => {
                        error!(
                            "Export stream database error at offset {} (waitlist {}): {}",
                            offset, waitlist_id, e
                        );
                        // 响应头早已发出，只能以 CSV 注释行报告错误并终止
                        let error_msg = format!("# ERROR: database error: {}\n", e.message());
                        return Some((
                            Ok::<_, actix_web::Error>(Bytes::from(error_msg)),
                            (offset, first, true),
                        ));
                    }
                };

                if batch.is_empty() {
                    if first {
                        // 空 waitlist：仍然发一份纯 header 文件
                        return match export_entries_csv(&[], true) {
                            Ok(bytes) => Some((Ok(Bytes::from(bytes)), (offset, false, true))),
                            Err(e) => {
                                error!("Failed to build CSV header: {}", e);
                                Some((
                                    Err(actix_web::error::ErrorInternalServerError(
                                        "CSV generation error",
                                    )),
                                    (offset, false, true),
                                ))
                            }
                        };
                    }
                    info!(
                        "Export stream completed: {} signups exported (waitlist {})",
                        offset, waitlist_id
                    );
                    return None;
                }

                let batch_len = batch.len() as u64;

                // CSV 序列化放到 blocking 线程池
                let csv_result =
                    tokio::task::spawn_blocking(move || export_entries_csv(&batch, first)).await;

                match csv_result {
                    Ok(Ok(chunk)) => {
                        let next_offset = offset + batch_len;
                        debug!(
                            "Export stream: sent batch of {} signups (total: {})",
                            batch_len, next_offset
                        );
                        Some((Ok(Bytes::from(chunk)), (next_offset, false, false)))
                    }
                    Ok(Err(e)) => {
                        error!("Failed to serialize CSV batch: {}", e);
                        Some((
                            Err(actix_web::error::ErrorInternalServerError(
                                "CSV generation error",
                            )),
                            (offset, false, true),
                        ))
                    }
                    Err(e) => {
                        error!("Blocking task panicked: {}", e);
                        Some((
                            Err(actix_web::error::ErrorInternalServerError("CSV task failed")),
                            (offset, false, true),
                        ))
                    }
                }
            }
        },
    );

    let filename = generate_export_filename(&waitlist.slug);
    info!("Admin API: starting streaming export to {}", filename);

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        ))
        .streaming(csv_stream))
}

/// 导入报名条目从 CSV
pub async fn import_signups(
    _req: HttpRequest,
    path: web::Path<i64>,
    mut payload: Multipart,
    service: web::Data<Arc<WaitlistService>>,
) -> ActixResult<impl Responder> {
    let waitlist_id = path.into_inner();
    info!("Admin API: import signups request - waitlist {}", waitlist_id);

    let mut csv_data: Option<Vec<u8>> = None;

    // 解析 multipart form data
    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(f) => f,
            Err(e) => {
                error!("Failed to parse multipart field: {}", e);
                return Ok(error_response(
                    actix_web::http::StatusCode::BAD_REQUEST,
                    ErrorCode::InvalidMultipartData,
                    &format!("Invalid multipart data: {}", e),
                ));
            }
        };

        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                // 读取文件内容（带大小限制）
                let mut data = Vec::new();
                while let Some(chunk) = field.next().await {
                    match chunk {
                        Ok(bytes) => {
                            if data.len() + bytes.len() > MAX_IMPORT_FILE_SIZE {
                                return Ok(error_response(
                                    actix_web::http::StatusCode::BAD_REQUEST,
                                    ErrorCode::FileTooLarge,
                                    &format!(
                                        "File size exceeds maximum {} MB",
                                        MAX_IMPORT_FILE_SIZE / 1024 / 1024
                                    ),
                                ));
                            }
                            data.extend_from_slice(&bytes);
                        }
                        Err(e) => {
                            error!("Failed to read file chunk: {}", e);
                            return Ok(error_response(
                                actix_web::http::StatusCode::BAD_REQUEST,
                                ErrorCode::FileReadError,
                                &format!("Failed to read file: {}", e),
                            ));
                        }
                    }
                }
                csv_data = Some(data);
            }
            _ => {
                // 忽略未知字段
            }
        }
    }

    // 验证文件存在
    let csv_data = match csv_data {
        Some(data) if !data.is_empty() => data,
        _ => {
            info!("Admin API: import rejected - no CSV file provided");
            return Ok(error_response(
                actix_web::http::StatusCode::BAD_REQUEST,
                ErrorCode::CsvFileMissing,
                "No CSV file provided",
            ));
        }
    };

    info!(
        "Admin API: import file size={} bytes (waitlist {})",
        csv_data.len(),
        waitlist_id
    );

    // 解析 CSV（单次解析，收集所有行）
    let cursor = Cursor::new(&csv_data);
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(cursor);

    let mut parse_failures: Vec<FailedRowResponse> = Vec::new();
    let mut parsed_rows: Vec<ImportSignupRaw> = Vec::new();

    for (row_idx, result) in csv_reader.deserialize::<CsvSignupRow>().enumerate() {
        let row_num = row_idx + 2; // CSV 行号（1-based，跳过 header）

        match result {
            Ok(row) => {
                parsed_rows.push(ImportSignupRaw {
                    email: row.email,
                    name: row.name,
                    row_num: Some(row_num),
                });
            }
            Err(e) => {
                parse_failures.push(FailedRowResponse {
                    row: Some(row_num),
                    email: String::new(),
                    reason: format!("CSV parse error: {}", e),
                });
            }
        }
    }

    if !parse_failures.is_empty() {
        warn!(
            "Admin API: {} rows failed to parse (waitlist {})",
            parse_failures.len(),
            waitlist_id
        );
    }

    // 调用 WaitlistService 处理导入（事务内去重 + 批量插入）
    let summary = match service.bulk_import(waitlist_id, parsed_rows).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(
                "Admin API: import failed for waitlist {} - {}",
                waitlist_id, e
            );
            return Ok(error_from_waitlister(&e));
        }
    };

    info!(
        "Admin API: import completed - processed: {}, created: {}, skipped: {}, failed: {}",
        summary.total_processed,
        summary.total_created,
        summary.skipped,
        summary.failed_rows.len() + parse_failures.len()
    );

    Ok(success_response(ImportResultResponse::from_summary(
        summary,
        parse_failures,
    )))
}
