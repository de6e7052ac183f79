//! Admin API 类型定义

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::services::{
    FailedImportRow, ImportSummary, PublicWaitlistView, SignupView, WaitlistDetail,
    WaitlistOverview,
};
use crate::storage::{Waitlist, WaitlistAnalytics, WaitlistEntry};

/// 输出目录常量
pub const TS_EXPORT_PATH: &str = "../dashboard/src/services/types.generated.ts";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaginatedResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
    pub pagination: PaginationInfo,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct PaginationInfo {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

impl PaginationInfo {
    pub fn new(total: u64, page: u64, limit: u64) -> Self {
        Self {
            total,
            page,
            limit,
            pages: total.div_ceil(limit.max(1)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct PostNewWaitlist {
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct JoinPayload {
    pub name: String,
    pub email: String,
    pub referral_source: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct StatusPayload {
    pub email: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct AddSubscriberPayload {
    pub email: String,
    pub name: Option<String>,
    #[ts(type = "Record<string, unknown> | null")]
    pub custom_data: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct PromotePayload {
    pub status: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct WaitlistResponse {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub created_at: String,
}

impl From<Waitlist> for WaitlistResponse {
    fn from(waitlist: Waitlist) -> Self {
        Self {
            id: waitlist.id,
            slug: waitlist.slug,
            name: waitlist.name,
            created_at: waitlist.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct WaitlistOverviewResponse {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub created_at: String,
    pub entry_count: u64,
}

impl From<WaitlistOverview> for WaitlistOverviewResponse {
    fn from(overview: WaitlistOverview) -> Self {
        Self {
            id: overview.waitlist.id,
            slug: overview.waitlist.slug,
            name: overview.waitlist.name,
            created_at: overview.waitlist.created_at.to_rfc3339(),
            entry_count: overview.entry_count,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct AnalyticsResponse {
    pub signups: i64,
    pub views: i64,
    #[ts(type = "Record<string, number> | null")]
    pub daily_stats: Option<serde_json::Value>,
    #[ts(type = "Record<string, unknown> | null")]
    pub utm_data: Option<serde_json::Value>,
    pub updated_at: String,
}

impl From<WaitlistAnalytics> for AnalyticsResponse {
    fn from(analytics: WaitlistAnalytics) -> Self {
        Self {
            signups: analytics.signups,
            views: analytics.views,
            daily_stats: analytics.daily_stats,
            utm_data: analytics.utm_data,
            updated_at: analytics.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct WaitlistDetailResponse {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub created_at: String,
    pub entry_count: u64,
    pub analytics: Option<AnalyticsResponse>,
}

impl From<WaitlistDetail> for WaitlistDetailResponse {
    fn from(detail: WaitlistDetail) -> Self {
        Self {
            id: detail.waitlist.id,
            slug: detail.waitlist.slug,
            name: detail.waitlist.name,
            created_at: detail.waitlist.created_at.to_rfc3339(),
            entry_count: detail.entry_count,
            analytics: detail.analytics.map(AnalyticsResponse::from),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct EntryResponse {
    pub id: i64,
    pub waitlist_id: i64,
    pub email: String,
    pub name: Option<String>,
    pub position: i64,
    pub referral_code: String,
    pub referral_source: Option<String>,
    pub referrals: i64,
    pub status: String,
    #[ts(type = "Record<string, unknown> | null")]
    pub custom_data: Option<serde_json::Value>,
    pub joined_at: String,
}

impl From<WaitlistEntry> for EntryResponse {
    fn from(entry: WaitlistEntry) -> Self {
        Self {
            id: entry.id,
            waitlist_id: entry.waitlist_id,
            email: entry.email,
            name: entry.name,
            position: entry.position,
            referral_code: entry.referral_code,
            referral_source: entry.referral_source,
            referrals: entry.referrals,
            status: entry.status.to_string(),
            custom_data: entry.custom_data,
            joined_at: entry.joined_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct PublicWaitlistResponse {
    pub name: String,
    pub total_count: u64,
}

impl From<PublicWaitlistView> for PublicWaitlistResponse {
    fn from(view: PublicWaitlistView) -> Self {
        Self {
            name: view.name,
            total_count: view.total_count,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct SignupResponse {
    pub position: i64,
    pub total_count: u64,
    pub referral_link: String,
}

impl From<SignupView> for SignupResponse {
    fn from(view: SignupView) -> Self {
        Self {
            position: view.position,
            total_count: view.total_count,
            referral_link: view.referral_link,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct FailedRowResponse {
    pub row: Option<usize>,
    pub email: String,
    pub reason: String,
}

impl From<FailedImportRow> for FailedRowResponse {
    fn from(row: FailedImportRow) -> Self {
        Self {
            row: row.row_num,
            email: row.email,
            reason: row.reason,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct ImportResultResponse {
    pub total_processed: usize,
    pub total_created: usize,
    pub skipped: usize,
    pub failed_rows: Vec<FailedRowResponse>,
}

impl ImportResultResponse {
    /// 合并 service 汇总与 handler 侧收集的 CSV 解析失败行
    pub fn from_summary(summary: ImportSummary, parse_failures: Vec<FailedRowResponse>) -> Self {
        let mut failed_rows: Vec<FailedRowResponse> = parse_failures;
        failed_rows.extend(summary.failed_rows.into_iter().map(FailedRowResponse::from));
        Self {
            total_processed: summary.total_processed,
            total_created: summary.total_created,
            skipped: summary.skipped,
            failed_rows,
        }
    }
}

// ============ 健康检查相关类型 ============

/// 存储健康检查状态
#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct HealthStorageCheck {
    pub status: String,
    pub backend: String,
    pub waitlists_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 健康检查项容器
#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct HealthChecks {
    pub storage: HealthStorageCheck,
}

/// 健康检查响应
#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(
    export,
    export_to = TS_EXPORT_PATH
)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u32,
    pub checks: HealthChecks,
    pub response_time_ms: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::services::admin::error_code::ErrorCode;

    #[test]
    fn export_typescript_types() {
        // 运行此测试会自动生成 TypeScript 类型文件
        // cargo test export_typescript_types -- --nocapture

        // Admin types
        PaginationInfo::export_all().expect("Failed to export PaginationInfo");
        PostNewWaitlist::export_all().expect("Failed to export PostNewWaitlist");
        PageQuery::export_all().expect("Failed to export PageQuery");
        JoinPayload::export_all().expect("Failed to export JoinPayload");
        StatusPayload::export_all().expect("Failed to export StatusPayload");
        AddSubscriberPayload::export_all().expect("Failed to export AddSubscriberPayload");
        PromotePayload::export_all().expect("Failed to export PromotePayload");
        WaitlistResponse::export_all().expect("Failed to export WaitlistResponse");
        WaitlistOverviewResponse::export_all().expect("Failed to export WaitlistOverviewResponse");
        WaitlistDetailResponse::export_all().expect("Failed to export WaitlistDetailResponse");
        AnalyticsResponse::export_all().expect("Failed to export AnalyticsResponse");
        EntryResponse::export_all().expect("Failed to export EntryResponse");
        PublicWaitlistResponse::export_all().expect("Failed to export PublicWaitlistResponse");
        SignupResponse::export_all().expect("Failed to export SignupResponse");
        FailedRowResponse::export_all().expect("Failed to export FailedRowResponse");
        ImportResultResponse::export_all().expect("Failed to export ImportResultResponse");

        // Health check types
        HealthStorageCheck::export_all().expect("Failed to export HealthStorageCheck");
        HealthChecks::export_all().expect("Failed to export HealthChecks");
        HealthResponse::export_all().expect("Failed to export HealthResponse");

        // Error codes
        ErrorCode::export_all().expect("Failed to export ErrorCode");
    }

    #[test]
    fn test_pagination_pages_rounding() {
        let info = PaginationInfo::new(41, 1, 20);
        assert_eq!(info.pages, 3);

        let info = PaginationInfo::new(40, 1, 20);
        assert_eq!(info.pages, 2);

        let info = PaginationInfo::new(0, 1, 20);
        assert_eq!(info.pages, 0);
    }

    #[test]
    fn test_entry_response_lowercase_status() {
        use crate::storage::EntryStatus;
        use chrono::Utc;

        let entry = WaitlistEntry {
            id: 7,
            waitlist_id: 1,
            email: "a@b.com".to_string(),
            name: None,
            position: 3,
            referral_code: "AbCd1234".to_string(),
            referral_source: None,
            referrals: 0,
            status: EntryStatus::Verified,
            custom_data: None,
            joined_at: Utc::now(),
        };

        let response = EntryResponse::from(entry);
        assert_eq!(response.status, "verified");
        assert_eq!(response.position, 3);
    }

}
