pub mod time;

use serde::{Deserialize, Serialize};
use std::fmt;

/// # Summary
/// 证券标的实体，代表系统关注的特定股票代码。
///
/// # Invariants
/// - `symbol` 非空且不含首尾空白。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stock {
    // 股票代码 (例如: AAPL, NFLX)
    pub symbol: String,
}

impl Stock {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }
}

impl fmt::Display for Stock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// # Summary
/// 将逐行书写的代码清单解析为有序的证券列表。
///
/// # Logic
/// 1. 按行切分并去除首尾空白。
/// 2. 过滤空行，保持原有顺序。
///
/// # Arguments
/// * `list`: 每行一个代码的文本。
///
/// # Returns
/// 证券列表，顺序与输入一致。
pub fn parse_tickers(list: &str) -> Vec<Stock> {
    list.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Stock::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tickers_skips_blank_lines() {
        let stocks = parse_tickers("\nADBE\n  ALGN \n\n\nAMZN\n");
        let symbols: Vec<&str> = stocks.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ADBE", "ALGN", "AMZN"]);
    }

    #[test]
    fn test_parse_tickers_empty_input() {
        assert!(parse_tickers("\n\n   \n").is_empty());
    }
}
