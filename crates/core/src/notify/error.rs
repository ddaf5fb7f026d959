use thiserror::Error;

/// # Summary
/// 聊天投递与指令轮询的错误枚举。
///
/// # Invariants
/// - 错误只记录日志，永远不会作为消息内容推送给订阅者。
#[derive(Error, Debug)]
pub enum NotifyError {
    /// 连接失败、超时等传输层问题
    #[error("Network error: {0}")]
    Network(String),

    /// 本地配置不可用，例如 Bot Token 为空
    #[error("Configuration error: {0}")]
    Config(String),

    /// 平台拒绝请求 (HTTP 非 2xx 或 `ok: false`)
    #[error("Platform error: {0}")]
    Platform(String),

    /// 平台响应无法解码
    #[error("Decode error: {0}")]
    Decode(String),
}
