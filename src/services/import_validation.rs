//! 导入行验证逻辑
//!
//! 提供统一的 "raw string fields → ImportSignupRich" 转换和验证，
//! Admin API 和 CSV Handler 共用一份规则。

use crate::errors::WaitlisterError;
use crate::utils::email::{normalize_email, validate_email};

/// 原始导入行（未规范化的 email / name）
#[derive(Debug, Clone)]
pub struct ImportSignupRaw {
    pub email: String,
    pub name: Option<String>,
    /// CSV 行号（1-based，含表头偏移），仅 Admin API 设置
    pub row_num: Option<usize>,
}

/// 验证通过的导入行（email 已规范化）
#[derive(Debug, Clone)]
pub struct ImportSignupRich {
    pub email: String,
    pub name: Option<String>,
    pub row_num: Option<usize>,
}

/// 单行验证错误
#[derive(Debug, Clone)]
pub struct ImportRowError {
    pub email: String,
    pub error: WaitlisterError,
    /// 来源行号，直接从 `ImportSignupRaw.row_num` 透传
    pub row_num: Option<usize>,
}

/// 验证并转换单个导入行
///
/// 验证顺序：
/// 1. email 非空
/// 2. email 格式合法（规范化后校验）
/// 3. name 去除空白，空串视为缺省
pub fn validate_import_row(raw: ImportSignupRaw) -> Result<ImportSignupRich, ImportRowError> {
    let row_num = raw.row_num;

    // 1. 空 email 检查
    if raw.email.trim().is_empty() {
        return Err(ImportRowError {
            email: raw.email,
            error: WaitlisterError::validation("Empty email"),
            row_num,
        });
    }

    // 2. email 校验
    let email = normalize_email(&raw.email);
    if let Err(e) = validate_email(&email) {
        return Err(ImportRowError {
            email: raw.email,
            error: WaitlisterError::validation(format!("Invalid email: {}", e)),
            row_num,
        });
    }

    // 3. name 清理
    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(ImportSignupRich {
        email,
        name,
        row_num,
    })
}

/// 批量验证导入行，返回 (成功项, 失败项)
pub fn validate_import_rows(
    rows: Vec<ImportSignupRaw>,
) -> (Vec<ImportSignupRich>, Vec<ImportRowError>) {
    let mut valid = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();

    for raw in rows {
        match validate_import_row(raw) {
            Ok(item) => valid.push(item),
            Err(e) => errors.push(e),
        }
    }

    (valid, errors)
}
