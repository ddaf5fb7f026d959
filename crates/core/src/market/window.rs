use crate::market::entity::Candle;
use crate::market::error::WindowError;
use chrono::{Duration, TimeDelta};

/// 系统统一使用的回溯天数。
pub const TRAILING_OFFSETS: [u32; 5] = [1, 7, 30, 90, 180];

/// # Summary
/// 单个证券的一段连续日 K 线，以及由其派生的峰值与回撤指标。
///
/// # Invariants
/// - `candles` 非空且按时间升序排列。
/// - 构造完成后不可变，`peak` 与 `drawdown_percent` 始终对应同一组 K 线。
/// - 子窗口只会收缩父窗口的 K 线集合，且与父窗口共享最后一根 K 线。
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    // 证券代码
    ticker: String,
    // 按时间升序的 K 线
    candles: Vec<Candle>,
    // 最高价所在 K 线的下标（并列时取最早一根）
    peak: usize,
    // 最新收盘价相对峰值的百分比，负数表示低于峰值
    drawdown_percent: f64,
}

impl Window {
    /// # Summary
    /// 由 K 线序列构造时间窗口，并一次性计算峰值与回撤。
    ///
    /// # Logic
    /// 1. 拒绝空序列与乱序序列。
    /// 2. 线性扫描 `high`，严格大于才替换峰值，保证并列时首个最大值胜出。
    /// 3. 计算 `(close / peak.high - 1) * 100`。峰值为 0 时不做保护，结果为非有限数。
    ///
    /// # Arguments
    /// * `ticker`: 证券代码。
    /// * `candles`: 按时间升序的 K 线。
    ///
    /// # Returns
    /// 成功返回 Window，序列为空或乱序时返回 WindowError。
    pub fn new(ticker: impl Into<String>, candles: Vec<Candle>) -> Result<Self, WindowError> {
        let Some(last) = candles.last() else {
            return Err(WindowError::Empty);
        };

        if let Some(index) = candles
            .windows(2)
            .position(|pair| pair[1].time < pair[0].time)
        {
            return Err(WindowError::Unordered(index + 1));
        }

        let mut peak = 0;
        let mut peak_high = candles[0].high;
        for (index, candle) in candles.iter().enumerate().skip(1) {
            if candle.high > peak_high {
                peak = index;
                peak_high = candle.high;
            }
        }

        let drawdown_percent = (last.close / peak_high - 1.0) * 100.0;

        Ok(Self {
            ticker: ticker.into(),
            candles,
            peak,
            drawdown_percent,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// 构造时已保证非空，恒为 false。
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// 最早的一根 K 线
    pub fn first(&self) -> &Candle {
        &self.candles[0]
    }

    /// 最新的一根 K 线
    pub fn last(&self) -> &Candle {
        &self.candles[self.candles.len() - 1]
    }

    /// 最后一根与第一根 K 线的时间差
    pub fn span(&self) -> TimeDelta {
        self.last().time - self.first().time
    }

    /// 最高价所在的 K 线
    pub fn peak(&self) -> &Candle {
        &self.candles[self.peak]
    }

    pub fn drawdown_percent(&self) -> f64 {
        self.drawdown_percent
    }

    /// # Summary
    /// 截取以同一根最新 K 线结尾、回溯 `days` 天的子窗口。
    ///
    /// # Logic
    /// 1. 计算截止点 `last.time - days`。
    /// 2. 保留时间严格晚于截止点的 K 线（序列有序，故为一段后缀）。
    /// 3. 以相同代码构造新窗口，峰值与回撤独立重新计算。
    ///
    /// # Arguments
    /// * `days`: 回溯天数，超过窗口跨度时返回全部 K 线。
    ///
    /// # Returns
    /// 子窗口。`days` 为 0 时没有任何 K 线满足条件，返回 `WindowError::Empty`。
    pub fn sub_window(&self, days: u32) -> Result<Window, WindowError> {
        let cutoff = self.last().time - Duration::days(i64::from(days));
        let start = self.candles.partition_point(|candle| candle.time <= cutoff);
        Window::new(self.ticker.clone(), self.candles[start..].to_vec())
    }
}
