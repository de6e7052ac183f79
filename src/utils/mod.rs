pub mod csv_handler;
pub mod email;

/// referral code 固定长度
pub const REFERRAL_CODE_LEN: usize = 8;

pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    // 随机选择字母和数字
    let chars = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    // 生成指定长度的随机字符串
    iter::repeat_with(|| chars[rand::random_range(0..chars.len())] as char)
        .take(length)
        .collect()
}

/// 生成 8 位 referral code
///
/// 唯一性由存储层的全局唯一索引保证，冲突时调用方重新生成。
pub fn generate_referral_code() -> String {
    generate_random_code(REFERRAL_CODE_LEN)
}

/// 将显示名称转为 URL slug
///
/// 小写，连续的非字母数字字符折叠为单个 '-'，首尾不带 '-'。
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// slug 合法性检查：小写字母、数字、'-'，长度 1..=64
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 64
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
