use crate::common::Stock;
use crate::market::entity::Candle;
use crate::market::error::MarketError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// # Summary
/// 行情数据提供者接口（原始数据源）。
///
/// # Invariants
/// - 每次调用只涉及一个证券，失败不得影响其他证券的抓取。
/// - 返回的 K 线按时间升序排列。
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// # Summary
    /// 获取特定证券在指定时间范围内的日 K 线数据。
    ///
    /// # Logic
    /// 1. 构建数据源请求。
    /// 2. 执行有超时上限的网络请求。
    /// 3. 解析并归一化响应数据。
    ///
    /// # Arguments
    /// * `stock`: 证券身份。
    /// * `start`: 开始时间 (UTC)。
    /// * `end`: 结束时间 (UTC)。
    ///
    /// # Returns
    /// 成功返回 K 线列表，失败返回 MarketError。
    async fn fetch_candles(
        &self,
        stock: &Stock,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError>;
}
