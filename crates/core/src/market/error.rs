use thiserror::Error;

/// # Summary
/// 行情抓取错误枚举，任何一种都只影响单个证券的本轮抓取。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
#[derive(Error, Debug)]
pub enum MarketError {
    // 网络层错误 (连接失败、超时等)
    #[error("Network error: {0}")]
    Network(String),
    // 数据源返回了非 2xx 的 HTTP 状态码
    #[error("HTTP status {0}")]
    Status(u16),
    // 数据源在响应体中声明的业务错误
    #[error("API error: {0}")]
    Api(String),
    // 数据解析错误，如 JSON 格式不匹配
    #[error("Parse error: {0}")]
    Parse(String),
    // 响应结构完整但内容不可用 (缺少数组、K 线为空)
    #[error("Malformed response: {0}")]
    Malformed(String),
    // 数据源配置非法，构造阶段即失败
    #[error("Invalid feed config: {0}")]
    Config(String),
}

/// # Summary
/// 时间窗口构造错误。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowError {
    // K 线序列为空，无法确定峰值与收盘价
    #[error("window has no candles")]
    Empty,
    // K 线未按时间升序排列
    #[error("candles are not in chronological order at index {0}")]
    Unordered(usize),
}
