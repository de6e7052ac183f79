//! Email 验证模块
//!
//! 入库前统一做归一化和语法检查

/// Email 验证错误
#[derive(Debug)]
pub enum EmailValidationError {
    EmptyEmail,
    MissingAtSign,
    EmptyLocalPart,
    InvalidDomain(String),
    TooLong(usize),
}

impl std::fmt::Display for EmailValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "Email cannot be empty"),
            Self::MissingAtSign => write!(f, "Email must contain exactly one '@'"),
            Self::EmptyLocalPart => write!(f, "Email local part cannot be empty"),
            Self::InvalidDomain(domain) => write!(f, "Invalid email domain: {}", domain),
            Self::TooLong(len) => write!(f, "Email too long: {} characters (max 254)", len),
        }
    }
}

impl std::error::Error for EmailValidationError {}

/// Email 最大长度（RFC 5321 上限）
const MAX_EMAIL_LEN: usize = 254;

/// 归一化 email：去首尾空白并转小写
///
/// 所有入库和查重路径都必须先经过此函数。
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// 验证 email 语法
///
/// 检查项目：
/// 1. 非空
/// 2. 恰好一个 '@'
/// 3. local 部分非空
/// 4. domain 部分包含 '.' 且不含空白
/// 5. 总长度不超过 254
pub fn validate_email(email: &str) -> Result<(), EmailValidationError> {
    if email.is_empty() {
        return Err(EmailValidationError::EmptyEmail);
    }

    if email.len() > MAX_EMAIL_LEN {
        return Err(EmailValidationError::TooLong(email.len()));
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err(EmailValidationError::MissingAtSign),
    };

    if local.is_empty() {
        return Err(EmailValidationError::EmptyLocalPart);
    }

    if domain.is_empty()
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || domain.chars().any(|c| c.is_whitespace())
    {
        return Err(EmailValidationError::InvalidDomain(domain.to_string()));
    }

    Ok(())
}
