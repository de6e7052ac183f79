//! 日志系统初始化
//!
//! 基于配置装配 tracing 订阅器：控制台或文件输出、按天滚动、json/text 两种格式。

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;

use crate::config::{LoggingConfig, StaticConfig};

/// 根据日志配置构造底层 writer
///
/// - 未配置文件或文件名为空时输出到 stdout
/// - 配置了文件且开启 rotation 时按天滚动，保留 max_backups 份
/// - 配置了文件但关闭 rotation 时追加写入单个文件
fn build_writer(logging: &LoggingConfig) -> Box<dyn io::Write + Send + Sync> {
    let log_file = match logging.file.as_deref() {
        Some(f) if !f.is_empty() => f,
        _ => return Box::new(io::stdout()),
    };

    if logging.enable_rotation {
        let path = Path::new(log_file);
        let dir = path.parent().unwrap_or(Path::new("."));
        let filename = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("waitlister.log");
        let appender = rolling::Builder::new()
            .rotation(rolling::Rotation::DAILY)
            .filename_prefix(filename.trim_end_matches(".log"))
            .filename_suffix("log")
            .max_log_files(logging.max_backups as usize)
            .build(dir)
            .expect("Failed to create rolling log appender");
        Box::new(appender)
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .expect("Failed to open log file");
        Box::new(file)
    }
}

/// Initialize logging system based on configuration
///
/// **Note**: This should be called only once during application startup,
/// after the configuration has been loaded.
///
/// # Returns
/// * `WorkerGuard` - Must be kept alive for the duration of the program
///   to ensure non-blocking log writes are flushed
///
/// # Panics
/// * If creating the log appender fails
/// * If setting the global subscriber fails (e.g., already initialized)
pub fn init_logging(config: &StaticConfig) -> WorkerGuard {
    let (non_blocking_writer, guard) =
        tracing_appender::non_blocking(build_writer(&config.logging));
    let filter = EnvFilter::new(config.logging.level.clone());

    // 写入文件时关闭 ANSI 颜色
    let to_console = config.logging.file.as_ref().is_none_or(|f| f.is_empty());

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(to_console);

    if config.logging.format == "json" {
        subscriber_builder.json().init();
    } else {
        subscriber_builder.init();
    }

    guard
}
