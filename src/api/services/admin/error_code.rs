//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};
use ts_rs::TS;

use crate::errors::WaitlisterError;

use super::types::TS_EXPORT_PATH;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，ts-rs 自动生成 TypeScript 类型。
/// 按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: waitlist 错误
/// - 3000-3099: 报名条目错误
/// - 4000-4099: 导入导出错误
/// - 5000-5099: 存储错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[ts(rename = "ErrorCode")]
#[ts(repr(enum))]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    NotFound = 1004,
    InternalServerError = 1005,
    FileTooLarge = 1011,
    RateLimitExceeded = 1020,
    ServiceUnavailable = 1030,

    // waitlist 错误 2000-2099
    WaitlistNotFound = 2000,
    SlugAlreadyExists = 2001,

    // 报名条目错误 3000-3099
    EntryNotFound = 3000,
    EmailAlreadyJoined = 3001,
    InvalidStatusChange = 3002,

    // 导入导出错误 4000-4099
    ImportFailed = 4000,
    ExportFailed = 4001,
    InvalidMultipartData = 4002,
    FileReadError = 4003,
    CsvFileMissing = 4004,
    CsvParseError = 4005,

    // 存储错误 5000-5099
    DatabaseError = 5000,
}

impl From<&WaitlisterError> for ErrorCode {
    fn from(err: &WaitlisterError) -> Self {
        match err {
            WaitlisterError::DatabaseConfig(_)
            | WaitlisterError::DatabaseConnection(_)
            | WaitlisterError::DatabaseOperation(_) => ErrorCode::DatabaseError,
            WaitlisterError::Validation(_) => ErrorCode::BadRequest,
            WaitlisterError::DuplicateEmail(_) => ErrorCode::EmailAlreadyJoined,
            WaitlisterError::DuplicateSlug(_) => ErrorCode::SlugAlreadyExists,
            WaitlisterError::NotFound(_) => ErrorCode::NotFound,
            WaitlisterError::InvalidImport(_) => ErrorCode::ImportFailed,
            WaitlisterError::Serialization(_) => ErrorCode::InternalServerError,
            WaitlisterError::FileOperation(_) => ErrorCode::FileReadError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values_are_stable() {
        assert_eq!(ErrorCode::Success as i32, 0);
        assert_eq!(ErrorCode::BadRequest as i32, 1000);
        assert_eq!(ErrorCode::SlugAlreadyExists as i32, 2001);
        assert_eq!(ErrorCode::EmailAlreadyJoined as i32, 3001);
        assert_eq!(ErrorCode::ImportFailed as i32, 4000);
        assert_eq!(ErrorCode::DatabaseError as i32, 5000);
    }

    #[test]
    fn test_mapping_from_waitlister_error() {
        let dup = WaitlisterError::duplicate_email("x@y.com 已在队列中");
        assert_eq!(ErrorCode::from(&dup), ErrorCode::EmailAlreadyJoined);

        let slug = WaitlisterError::duplicate_slug("slug 已存在");
        assert_eq!(ErrorCode::from(&slug), ErrorCode::SlugAlreadyExists);

        let missing = WaitlisterError::not_found("waitlist 不存在");
        assert_eq!(ErrorCode::from(&missing), ErrorCode::NotFound);

        let db = WaitlisterError::database_operation("boom");
        assert_eq!(ErrorCode::from(&db), ErrorCode::DatabaseError);
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&ErrorCode::EmailAlreadyJoined).unwrap();
        assert_eq!(json, "3001");
    }
}
