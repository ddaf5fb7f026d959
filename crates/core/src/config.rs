use crate::common::{Stock, parse_tickers};
use serde::{Deserialize, Serialize};

/// 默认关注的证券清单，每行一个代码。
pub const DEFAULT_TICKERS: &str = "
ADBE
ALGN
AMZN
CME
EA
ETFC
FB
GOOG
IDXX
INTC
INTU
LRCX
MA
NDAQ
NFLX
NOC
NVDA
PGR
RTN
SPGI
TXN
UNH
V
VLO

AAPL
ALL
AMAT
ATVI
BA
BABA
BBY
CNC
CTAS
EL
FLIR
ISRG
KLAC
MAS
MPC
MU
NTAP
SYY
TWTR
WM
XYL
";

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub watch: WatchConfig,
    pub feed: FeedConfig,
    pub telegram: TelegramConfig,
}

/// 轮询周期与关注清单
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub tickers: Vec<String>,
    pub interval_secs: u64,
    pub lookback_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    // 交易所固定时区偏移（小时），K 线时间按此偏移展示
    pub utc_offset_hours: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    // 默认为空，需通过 DIPWATCH__TELEGRAM__BOT_TOKEN 提供
    pub bot_token: String,
    pub api_base: String,
    pub poll_timeout_secs: u64,
}

impl WatchConfig {
    /// 去除空白项后的证券列表，保持配置顺序
    pub fn stocks(&self) -> Vec<Stock> {
        parse_tickers(&self.tickers.join("\n"))
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            tickers: parse_tickers(DEFAULT_TICKERS)
                .into_iter()
                .map(|stock| stock.symbol)
                .collect(),
            interval_secs: 300,
            lookback_days: 180,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 10,
            utc_offset_hours: -4,
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 30,
        }
    }
}
