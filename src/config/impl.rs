use std::sync::{Arc, OnceLock};

use super::StaticConfig;

static CONFIG: OnceLock<Arc<StaticConfig>> = OnceLock::new();

/// 取全局配置
///
/// 返回 Arc 克隆，调用方随便持有，不涉及锁。
/// 必须先调用 [`init_config`]，否则 panic。
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
        .clone()
}

/// 初始化全局配置（幂等）
///
/// 配置来源：当前目录的 config.toml，叠加 `WL__` 前缀的环境变量；
/// 文件不存在时直接用默认值。
///
/// ```no_run
/// use waitlister::config::init_config;
/// init_config();
/// ```
pub fn init_config() {
    CONFIG.get_or_init(|| Arc::new(StaticConfig::load()));
}
