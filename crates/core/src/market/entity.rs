use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// # Summary
/// 单根日 K 线数据实体，记录一个交易日内的行情波动。
///
/// # Invariants
/// - 构造后不再修改。
/// - 数据源中缺失 (null) 的价格统一归一化为 0。
/// - `time` 保留交易所所在的固定时区偏移。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    // K 线开始时间
    pub time: DateTime<FixedOffset>,
    // 开盘价
    pub open: f64,
    // 最高价
    pub high: f64,
    // 最低价
    pub low: f64,
    // 收盘价
    pub close: f64,
}
