//! CSV 导入导出共享逻辑
//!
//! 导入行的反序列化结构和导出行的序列化结构，供 Admin API 使用

use chrono::Utc;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};

use crate::errors::WaitlisterError;
use crate::storage::WaitlistEntry;

/// CSV 导入行（header 必须含 email 列，name 可选）
#[derive(Debug, Clone, Deserialize)]
pub struct CsvSignupRow {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// CSV 导出行（仅用于序列化）
#[derive(Debug, Clone, Serialize)]
pub struct CsvEntryRow {
    pub email: String,
    pub name: String,
    pub position: i64,
    pub referral_code: String,
    pub referrals: i64,
    pub status: String,
    pub joined_at: String,
}

impl From<&WaitlistEntry> for CsvEntryRow {
    fn from(entry: &WaitlistEntry) -> Self {
        Self {
            email: entry.email.clone(),
            name: entry.name.clone().unwrap_or_default(),
            position: entry.position,
            referral_code: entry.referral_code.clone(),
            referrals: entry.referrals,
            status: entry.status.to_string(),
            joined_at: entry.joined_at.to_rfc3339(),
        }
    }
}

/// 导出列顺序，和 `CsvEntryRow` 字段声明保持一致
pub const EXPORT_HEADER: &[&str] = &[
    "email",
    "name",
    "position",
    "referral_code",
    "referrals",
    "status",
    "joined_at",
];

/// 将一批 entry 序列化为 CSV 字节
///
/// 流式导出按页调用，只有第一页带 header。header 显式写出，
/// 空 waitlist 的导出也能拿到纯 header 文件。
pub fn export_entries_csv(
    entries: &[WaitlistEntry],
    include_header: bool,
) -> Result<Vec<u8>, WaitlisterError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    if include_header {
        writer.write_record(EXPORT_HEADER).map_err(|e| {
            WaitlisterError::serialization(format!("Failed to write CSV header: {}", e))
        })?;
    }

    for entry in entries {
        let row = CsvEntryRow::from(entry);
        writer.serialize(&row).map_err(|e| {
            WaitlisterError::serialization(format!("Failed to write CSV row: {}", e))
        })?;
    }

    writer
        .into_inner()
        .map_err(|e| WaitlisterError::serialization(format!("Failed to flush CSV: {}", e)))
}

/// 生成默认导出文件名（带时间戳）
pub fn generate_export_filename(slug: &str) -> String {
    format!("{}_signups_{}.csv", slug, Utc::now().format("%Y%m%d_%H%M%S"))
}
