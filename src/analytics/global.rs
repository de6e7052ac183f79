use std::sync::{Arc, OnceLock};
use tracing::trace;

use super::manager::ViewTracker;

pub static GLOBAL_VIEW_TRACKER: OnceLock<Arc<ViewTracker>> = OnceLock::new();

/// 初始化全局浏览计数器（只允许初始化一次）
pub fn set_global_view_tracker(tracker: Arc<ViewTracker>) {
    if GLOBAL_VIEW_TRACKER.set(tracker).is_err() {
        panic!("GLOBAL_VIEW_TRACKER has already been set");
    }
}

/// 获取全局浏览计数器
pub fn get_view_tracker() -> Option<&'static Arc<ViewTracker>> {
    match GLOBAL_VIEW_TRACKER.get() {
        Some(tracker) => Some(tracker),
        None => {
            trace!("GLOBAL_VIEW_TRACKER has not been initialized yet");
            None
        }
    }
}
