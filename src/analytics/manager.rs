//! 页面浏览统计
//!
//! 落地页每次被打开都记一次 view，写入走缓冲：
//! - 高并发计数（使用 DashMap）
//! - 定时刷盘到存储后端
//! - 阈值触发刷盘
//! - 刷盘失败时数据还回缓冲区

use dashmap::DashMap;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};
use tracing::{debug, trace, warn};

use crate::analytics::ViewSink;

/// 浏览计数缓冲区，封装所有可变状态
struct ViewBuffer {
    /// 各 waitlist 的待刷计数
    data: DashMap<i64, usize>,
    /// 缓冲区中的总浏览数（用于阈值判断）
    total_views: AtomicUsize,
    /// 刷盘锁，防止并发刷盘
    flush_lock: Mutex<()>,
    /// 是否有 flush 任务待处理（防止重复 spawn）
    flush_pending: AtomicBool,
}

impl ViewBuffer {
    fn new() -> Self {
        Self {
            data: DashMap::new(),
            total_views: AtomicUsize::new(0),
            flush_lock: Mutex::new(()),
            flush_pending: AtomicBool::new(false),
        }
    }

    /// 增加浏览计数
    fn increment(&self, waitlist_id: i64) -> usize {
        self.data
            .entry(waitlist_id)
            .and_modify(|v| *v += 1)
            .or_insert(1);
        trace!("ViewBuffer: Incremented waitlist: {}", waitlist_id);

        self.total_views.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 收集所有更新并清空缓冲区（逐个 remove 避免竞态）
    fn drain(&self) -> Vec<(i64, usize)> {
        // 1. 收集所有 key（snapshot）
        let keys: Vec<i64> = self.data.iter().map(|r| *r.key()).collect();

        // 2. 逐个 remove（只删除 snapshot 中的 key，不影响窗口期新增）
        let mut updates = Vec::with_capacity(keys.len());
        let mut total_removed = 0;
        for key in keys {
            if let Some((k, v)) = self.data.remove(&key) {
                total_removed += v;
                updates.push((k, v));
            }
        }

        // 3. 更新总计数
        if total_removed > 0 {
            self.total_views
                .fetch_update(Ordering::Release, Ordering::Relaxed, |current| {
                    Some(current.saturating_sub(total_removed))
                })
                .ok();
        }

        updates
    }

    /// 恢复数据到缓冲区（用于刷盘失败时的恢复）
    fn restore(&self, updates: Vec<(i64, usize)>) {
        let mut restored_total = 0;
        for (k, v) in updates {
            *self.data.entry(k).or_insert(0) += v;
            restored_total += v;
        }
        self.total_views.fetch_add(restored_total, Ordering::Relaxed);
    }

    /// 获取当前缓冲区总浏览数
    fn total(&self) -> usize {
        self.total_views.load(Ordering::Relaxed)
    }
}

/// 浏览计数器
///
/// 负责收集落地页浏览并定期刷盘到存储后端。
/// 状态完全封装在结构体内部，便于测试和多实例使用。
#[derive(Clone)]
pub struct ViewTracker {
    /// 浏览缓冲区（共享所有权）
    buffer: Arc<ViewBuffer>,
    /// 存储后端
    sink: Arc<dyn ViewSink>,
    /// 刷盘间隔
    flush_interval: Duration,
    /// 触发刷盘的最大浏览数
    max_views_before_flush: usize,
}

impl ViewTracker {
    pub fn new(
        sink: Arc<dyn ViewSink>,
        flush_interval: Duration,
        max_views_before_flush: usize,
    ) -> Self {
        Self {
            buffer: Arc::new(ViewBuffer::new()),
            sink,
            flush_interval,
            max_views_before_flush,
        }
    }

    /// 增加浏览计数（线程安全，无锁）
    pub fn increment(&self, waitlist_id: i64) {
        let current_size = self.buffer.increment(waitlist_id);
        trace!("ViewTracker: Current buffer size: {}", current_size);

        // 检查是否达到阈值，尝试触发刷盘
        if current_size >= self.max_views_before_flush {
            // 使用 compare_exchange 防止任务风暴：
            // 只有成功将 flush_pending 从 false 设为 true 的线程才 spawn
            if self
                .buffer
                .flush_pending
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                let buffer = Arc::clone(&self.buffer);
                let sink = Arc::clone(&self.sink);
                tokio::spawn(async move {
                    if let Ok(_guard) = buffer.flush_lock.try_lock() {
                        Self::flush_buffer(&buffer, &sink).await;
                    } else {
                        trace!("ViewTracker: flush already in progress, skipping");
                    }
                    // 无论成功与否都重置标志，允许下次触发
                    buffer.flush_pending.store(false, Ordering::Release);
                });
            }
        }
    }

    /// 启动后台刷盘任务（作为异步方法运行）
    pub async fn start_background_task(&self) {
        loop {
            sleep(self.flush_interval).await;

            debug!("ViewTracker: Triggering scheduled flush");
            // 定期触发刷盘
            if let Ok(_guard) = self.buffer.flush_lock.try_lock() {
                trace!("ViewTracker: Starting scheduled flush");
                Self::flush_buffer(&self.buffer, &self.sink).await;
            } else {
                trace!("ViewTracker: flush already in progress, skipping scheduled flush");
            }
        }
    }

    /// 手动触发刷盘（阻塞直到完成）
    pub async fn flush(&self) {
        debug!("ViewTracker: Manual flush triggered");
        let _guard = self.buffer.flush_lock.lock().await;
        Self::flush_buffer(&self.buffer, &self.sink).await;
    }

    /// 执行实际的刷盘操作
    async fn flush_buffer(buffer: &ViewBuffer, sink: &Arc<dyn ViewSink>) {
        let updates = buffer.drain();

        if updates.is_empty() {
            trace!("ViewTracker: No views to flush");
            return;
        }

        let count = updates.len();
        match sink.flush_views(updates.clone()).await {
            Ok(_) => {
                debug!("ViewTracker: Successfully flushed {} entries", count);
            }
            Err(e) => {
                // 刷盘失败，恢复数据到 buffer
                buffer.restore(updates);
                warn!(
                    "ViewTracker: flush_views failed: {}, {} entries restored to buffer",
                    e, count
                );
            }
        }
    }

    /// 获取当前缓冲区总浏览数（用于监控）
    pub fn buffer_size(&self) -> usize {
        self.buffer.total()
    }
}
