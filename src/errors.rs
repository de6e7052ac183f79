use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum WaitlisterError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Validation(String),
    DuplicateEmail(String),
    DuplicateSlug(String),
    NotFound(String),
    InvalidImport(String),
    Serialization(String),
    FileOperation(String),
}

impl WaitlisterError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            WaitlisterError::DatabaseConfig(_) => "E001",
            WaitlisterError::DatabaseConnection(_) => "E002",
            WaitlisterError::DatabaseOperation(_) => "E003",
            WaitlisterError::Validation(_) => "E004",
            WaitlisterError::DuplicateEmail(_) => "E005",
            WaitlisterError::DuplicateSlug(_) => "E006",
            WaitlisterError::NotFound(_) => "E007",
            WaitlisterError::InvalidImport(_) => "E008",
            WaitlisterError::Serialization(_) => "E009",
            WaitlisterError::FileOperation(_) => "E010",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            WaitlisterError::DatabaseConfig(_) => "Database Configuration Error",
            WaitlisterError::DatabaseConnection(_) => "Database Connection Error",
            WaitlisterError::DatabaseOperation(_) => "Database Operation Error",
            WaitlisterError::Validation(_) => "Validation Error",
            WaitlisterError::DuplicateEmail(_) => "Duplicate Email",
            WaitlisterError::DuplicateSlug(_) => "Duplicate Slug",
            WaitlisterError::NotFound(_) => "Resource Not Found",
            WaitlisterError::InvalidImport(_) => "Invalid Import",
            WaitlisterError::Serialization(_) => "Serialization Error",
            WaitlisterError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            WaitlisterError::DatabaseConfig(msg) => msg,
            WaitlisterError::DatabaseConnection(msg) => msg,
            WaitlisterError::DatabaseOperation(msg) => msg,
            WaitlisterError::Validation(msg) => msg,
            WaitlisterError::DuplicateEmail(msg) => msg,
            WaitlisterError::DuplicateSlug(msg) => msg,
            WaitlisterError::NotFound(msg) => msg,
            WaitlisterError::InvalidImport(msg) => msg,
            WaitlisterError::Serialization(msg) => msg,
            WaitlisterError::FileOperation(msg) => msg,
        }
    }

    /// 错误对应的 HTTP 状态码
    ///
    /// DuplicateEmail 默认 409；公开 join 端点按约定降级为 400，
    /// 由该 handler 自行覆盖。
    pub fn http_status(&self) -> StatusCode {
        match self {
            WaitlisterError::Validation(_) => StatusCode::BAD_REQUEST,
            WaitlisterError::InvalidImport(_) => StatusCode::BAD_REQUEST,
            WaitlisterError::DuplicateEmail(_) => StatusCode::CONFLICT,
            WaitlisterError::DuplicateSlug(_) => StatusCode::CONFLICT,
            WaitlisterError::NotFound(_) => StatusCode::NOT_FOUND,
            WaitlisterError::DatabaseConfig(_)
            | WaitlisterError::DatabaseConnection(_)
            | WaitlisterError::DatabaseOperation(_)
            | WaitlisterError::Serialization(_)
            | WaitlisterError::FileOperation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for WaitlisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 默认使用简洁格式
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for WaitlisterError {}

// 便捷的构造函数
impl WaitlisterError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        WaitlisterError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        WaitlisterError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        WaitlisterError::DatabaseOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        WaitlisterError::Validation(msg.into())
    }

    pub fn duplicate_email<T: Into<String>>(msg: T) -> Self {
        WaitlisterError::DuplicateEmail(msg.into())
    }

    pub fn duplicate_slug<T: Into<String>>(msg: T) -> Self {
        WaitlisterError::DuplicateSlug(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        WaitlisterError::NotFound(msg.into())
    }

    pub fn invalid_import<T: Into<String>>(msg: T) -> Self {
        WaitlisterError::InvalidImport(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        WaitlisterError::Serialization(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        WaitlisterError::FileOperation(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for WaitlisterError {
    fn from(err: sea_orm::DbErr) -> Self {
        WaitlisterError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for WaitlisterError {
    fn from(err: std::io::Error) -> Self {
        WaitlisterError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for WaitlisterError {
    fn from(err: serde_json::Error) -> Self {
        WaitlisterError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WaitlisterError>;
