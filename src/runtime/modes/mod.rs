//! Mode routing
//!
//! 服务只有 HTTP server 一种运行模式，入口统一从这里导出。

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "server")]
pub use server::run_server;
