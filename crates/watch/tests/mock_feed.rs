use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use dipwatch_core::common::Stock;
use dipwatch_core::market::entity::Candle;
use dipwatch_core::market::error::MarketError;
use dipwatch_core::market::port::MarketDataProvider;
use dipwatch_core::notify::error::NotifyError;
use dipwatch_core::notify::port::{ChatId, Notifier};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

/// 以 2024-01-02 16:00 (UTC-4) 为第 0 天，按 (天数, 价格) 生成日线
pub fn candles(points: &[(i64, f64)]) -> Vec<Candle> {
    let tz = FixedOffset::west_opt(4 * 3600).unwrap();
    let base = tz.with_ymd_and_hms(2024, 1, 2, 16, 0, 0).unwrap();
    points
        .iter()
        .map(|&(day, price)| Candle {
            time: base + Duration::days(day),
            open: price,
            high: price,
            low: price,
            close: price,
        })
        .collect()
}

/// # Summary
/// 按证券预先编排每一轮返回结果的行情源。
///
/// # Logic
/// 每次抓取弹出该证券队列的第一项，队列耗尽后返回网络错误。
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<String, VecDeque<Result<Vec<Candle>, MarketError>>>>,
    pub requests: Mutex<Vec<(String, DateTime<Utc>, DateTime<Utc>)>>,
}

impl ScriptedProvider {
    pub fn push(&self, ticker: &str, outcome: Result<Vec<Candle>, MarketError>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(ticker.to_string())
            .or_default()
            .push_back(outcome);
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    async fn fetch_candles(
        &self,
        stock: &Stock,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError> {
        self.requests
            .lock()
            .unwrap()
            .push((stock.symbol.clone(), start, end));
        self.scripts
            .lock()
            .unwrap()
            .get_mut(&stock.symbol)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(MarketError::Network("script exhausted".into())))
    }
}

/// # Summary
/// 每次抓取都挂起一段时间的行情源，记录同时在途的最大请求数。
#[derive(Default)]
pub struct SlowProvider {
    active: AtomicUsize,
    pub peak: AtomicUsize,
    pub calls: AtomicUsize,
}

#[async_trait]
impl MarketDataProvider for SlowProvider {
    async fn fetch_candles(
        &self,
        _stock: &Stock,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError> {
        let in_flight = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(in_flight, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(StdDuration::from_millis(50)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(candles(&[(0, 100.0), (10, 90.0)]))
    }
}

/// 记录每次投递，可指定一个始终失败的会话
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(ChatId, String)>>,
    pub failing: Option<ChatId>,
}

impl RecordingNotifier {
    pub fn failing_for(chat_id: ChatId) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: Some(chat_id),
        }
    }

    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), NotifyError> {
        if self.failing == Some(chat_id) {
            return Err(NotifyError::Platform("Forbidden: bot was blocked".into()));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}
