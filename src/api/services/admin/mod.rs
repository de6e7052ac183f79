//! Admin API 服务模块
//!
//! 该模块包含管理 API 的所有端点，包括：
//! - waitlist CRUD 操作
//! - 报名条目管理（分页、添加、状态推进）
//! - CSV 导入导出
//!
//! 认证由部署侧的反向代理负责，本模块不做鉴权。

pub mod error_code;
mod export_import;
mod helpers;
pub mod routes;
mod subscriber_ops;
mod types;
mod waitlist_ops;

// 重新导出类型
pub use types::*;

// 重新导出帮助函数
pub use helpers::{
    api_result, created_response, error_from_waitlister, error_response, json_response,
    success_response,
};

// 重新导出错误码
pub use error_code::ErrorCode;

// 重新导出 waitlist 管理端点
pub use waitlist_ops::{get_all_waitlists, get_waitlist_detail, post_waitlist};

// 重新导出报名条目管理端点
pub use subscriber_ops::{get_subscribers, post_subscriber, promote_subscriber};

// 重新导出导出导入端点
pub use export_import::{export_signups, import_signups};
