/// 页面浏览计数 Sink（聚合模式）
///
/// 实现方收到的是 (waitlist_id, 累计次数) 列表，失败时整批返回错误，
/// 由调用方负责把数据还回缓冲区。
#[async_trait::async_trait]
pub trait ViewSink: Send + Sync {
    async fn flush_views(&self, updates: Vec<(i64, usize)>) -> anyhow::Result<()>;
}
