use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use dipwatch_core::common::Stock;
use dipwatch_core::config::FeedConfig;
use dipwatch_core::market::entity::Candle;
use dipwatch_core::market::error::MarketError;
use dipwatch_core::market::port::MarketDataProvider;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// # Summary
/// Yahoo Finance 日线行情提供者实现。
///
/// # Invariants
/// - 使用 `reqwest` 异步客户端进行通讯，每次请求受连接与总超时约束。
/// - 返回的 K 线时间统一换算到配置的交易所时区偏移。
#[derive(Clone)]
pub struct YahooProvider {
    /// 内部使用的 HTTP 客户端
    client: Client,
    /// 接口根地址，测试时指向本地 mock 服务
    base_url: String,
    /// K 线时间使用的固定时区
    offset: FixedOffset,
}

impl YahooProvider {
    /// # Summary
    /// 根据配置创建一个新的 YahooProvider 实例。
    ///
    /// # Logic
    /// 1. 安装 rustls 加密提供者（幂等）。
    /// 2. 配置连接超时与总超时。
    /// 3. 设置伪装浏览器 Header (User-Agent) 以减少被拦截风险。
    ///
    /// # Arguments
    /// * `config`: 行情源配置。
    ///
    /// # Returns
    /// 成功返回 YahooProvider，时区偏移非法或客户端构建失败返回 MarketError。
    pub fn new(config: &FeedConfig) -> Result<Self, MarketError> {
        dipwatch_core::install_crypto_provider();

        let offset = config
            .utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                MarketError::Config(format!(
                    "utc_offset_hours must be within -23..=23, got {}",
                    config.utc_offset_hours
                ))
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| MarketError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            offset,
        })
    }
}

/// # Summary
/// Yahoo API 响应顶层结构。
///
/// # Invariants
/// - 映射自 Yahoo v8 chart 接口。
#[derive(Deserialize, Debug)]
struct YahooResponse {
    chart: YahooChart,
}

#[derive(Deserialize, Debug)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Deserialize, Debug)]
struct YahooError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// 单个时间序列结果。无成交区间时 Yahoo 会省略 `timestamp`。
#[derive(Deserialize, Debug)]
struct YahooResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Deserialize, Debug)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

/// # Summary
/// Yahoo API 原始报价数据，四个数组与 `timestamp` 按下标对齐。
#[derive(Deserialize, Debug)]
struct YahooQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
}

impl YahooError {
    fn message(&self) -> String {
        match (&self.code, &self.description) {
            (Some(code), Some(desc)) => format!("{}: {}", code, desc),
            (Some(code), None) => code.clone(),
            (None, Some(desc)) => desc.clone(),
            (None, None) => "unspecified error".to_string(),
        }
    }
}

/// # Summary
/// 将 chart 响应归一化为按时间排列的 K 线。
///
/// # Logic
/// 1. `chart.error` 非空视为业务失败。
/// 2. 取第一个 result 与第一个 quote，缺失任一数组视为畸形响应。
/// 3. 按最短数组长度对齐拉链，null 价格归一化为 0。
/// 4. 空序列视为畸形响应。
///
/// # Arguments
/// * `response`: 已反序列化的响应。
/// * `offset`: K 线时间使用的时区偏移。
///
/// # Returns
/// 非空的 K 线列表，或 MarketError。
fn into_candles(response: YahooResponse, offset: FixedOffset) -> Result<Vec<Candle>, MarketError> {
    if let Some(err) = response.chart.error {
        return Err(MarketError::Api(err.message()));
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| MarketError::Malformed("missing chart result".into()))?;

    let timestamps = result
        .timestamp
        .ok_or_else(|| MarketError::Malformed("missing timestamp array".into()))?;
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| MarketError::Malformed("missing quote data".into()))?;

    let missing = |name: &str| MarketError::Malformed(format!("missing {} array", name));
    let open = quote.open.ok_or_else(|| missing("open"))?;
    let high = quote.high.ok_or_else(|| missing("high"))?;
    let low = quote.low.ok_or_else(|| missing("low"))?;
    let close = quote.close.ok_or_else(|| missing("close"))?;

    let candles = timestamps
        .iter()
        .zip(open)
        .zip(high)
        .zip(low)
        .zip(close)
        .map(|((((&ts, o), h), l), c)| {
            let time = offset
                .timestamp_opt(ts, 0)
                .single()
                .ok_or_else(|| MarketError::Malformed(format!("invalid timestamp {}", ts)))?;
            Ok(Candle {
                time,
                open: o.unwrap_or(0.0),
                high: h.unwrap_or(0.0),
                low: l.unwrap_or(0.0),
                close: c.unwrap_or(0.0),
            })
        })
        .collect::<Result<Vec<_>, MarketError>>()?;

    if candles.is_empty() {
        return Err(MarketError::Malformed("empty candle series".into()));
    }

    Ok(candles)
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    /// # Summary
    /// 从 Yahoo Finance 抓取日 K 线历史数据。
    ///
    /// # Logic
    /// 1. 构建包含 period1, period2 (UTC 秒) 的 chart 请求，排除盘前盘后。
    /// 2. 非 2xx 状态码直接失败。
    /// 3. 解析嵌套 JSON 并归一化为 K 线。
    ///
    /// # Arguments
    /// * `stock`: 证券实体。
    /// * `start`: 开始时间。
    /// * `end`: 结束时间。
    ///
    /// # Returns
    /// 成功返回非空 K 线列表，失败返回 MarketError。
    async fn fetch_candles(
        &self,
        stock: &Stock,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError> {
        let symbol = stock.symbol.as_str();
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let period1 = start.timestamp().to_string();
        let period2 = end.timestamp().to_string();

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
                ("includePrePost", "false"),
                ("events", "div|split|earn"),
            ])
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MarketError::Status(status.as_u16()));
        }

        let json: YahooResponse = resp
            .json()
            .await
            .map_err(|e| MarketError::Parse(e.to_string()))?;

        let candles = into_candles(json, self.offset)?;
        debug!("Fetched {} candles for {}", candles.len(), symbol);
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edt() -> FixedOffset {
        FixedOffset::west_opt(4 * 3600).unwrap()
    }

    #[test]
    fn test_out_of_range_offset_is_config_error() {
        let config = FeedConfig {
            utc_offset_hours: 30,
            ..FeedConfig::default()
        };
        let result = YahooProvider::new(&config);
        assert!(matches!(result, Err(MarketError::Config(msg)) if msg.contains("30")));
    }

    fn parse(body: &str) -> Result<Vec<Candle>, MarketError> {
        let response: YahooResponse = serde_json::from_str(body).unwrap();
        into_candles(response, edt())
    }

    #[test]
    fn test_nulls_normalize_to_zero() {
        let candles = parse(
            r#"{"chart":{"error":null,"result":[{"timestamp":[1704205800,1704292200],
            "indicators":{"quote":[{"open":[1.0,null],"high":[2.0,null],"low":[0.5,null],"close":[1.5,null]}]}}]}}"#,
        )
        .unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].high, 2.0);
        assert_eq!(candles[1].open, 0.0);
        assert_eq!(candles[1].close, 0.0);
        assert_eq!(candles[0].time.offset(), &edt());
        assert_eq!(candles[0].time.timestamp(), 1704205800);
    }

    #[test]
    fn test_parallel_arrays_truncate_to_shortest() {
        let candles = parse(
            r#"{"chart":{"error":null,"result":[{"timestamp":[1,2,3],
            "indicators":{"quote":[{"open":[1.0,1.0,1.0],"high":[2.0,2.0],"low":[0.5,0.5,0.5],"close":[1.5,1.5,1.5]}]}}]}}"#,
        )
        .unwrap();
        assert_eq!(candles.len(), 2);
    }

    #[test]
    fn test_api_error_field() {
        let err = parse(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, MarketError::Api(msg) if msg.starts_with("Not Found")));
    }

    #[test]
    fn test_missing_arrays_are_malformed() {
        let err = parse(
            r#"{"chart":{"error":null,"result":[{"indicators":{"quote":[{}]}}]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, MarketError::Malformed(_)));

        let err = parse(
            r#"{"chart":{"error":null,"result":[{"timestamp":[1],"indicators":{"quote":[{"open":[1.0],"high":[1.0],"low":[1.0]}]}}]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, MarketError::Malformed(msg) if msg.contains("close")));
    }

    #[test]
    fn test_empty_series_is_malformed() {
        let err = parse(
            r#"{"chart":{"error":null,"result":[{"timestamp":[],"indicators":{"quote":[{"open":[],"high":[],"low":[],"close":[]}]}}]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, MarketError::Malformed(_)));

        let err = parse(r#"{"chart":{"error":null,"result":[]}}"#).unwrap_err();
        assert!(matches!(err, MarketError::Malformed(_)));
    }
}
