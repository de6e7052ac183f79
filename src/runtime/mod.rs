//! Runtime layer
//!
//! 负责进程生命周期（启动准备、优雅关闭）和运行模式入口。

pub mod lifetime;
pub mod modes;
