pub mod common;
pub mod config;
pub mod market;
pub mod notify;
pub mod watch;

/// # Summary
/// 为 `rustls-no-provider` 构建的 HTTP 客户端安装进程级 `ring` 加密提供者。
///
/// # Logic
/// 1. 尝试安装默认提供者。
/// 2. 若已被其他调用方安装则保持原状，可重复调用。
///
/// # Returns
/// 本次调用完成安装返回 true，已存在提供者时返回 false。
pub fn install_crypto_provider() -> bool {
    rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok()
}
