use crate::notify::entity::ChatCommand;
use crate::notify::error::NotifyError;
use async_trait::async_trait;

/// 聊天会话标识（Telegram chat id）。
pub type ChatId = i64;

/// # Summary
/// 向外部聊天系统发送文本消息的接口定义。
///
/// # Invariants
/// - 实现必须是 `Send` 和 `Sync` 以支持并发调用。
/// - 一次调用只投递给一个会话，广播由调用方遍历订阅者完成。
#[async_trait]
pub trait Notifier: Send + Sync {
    /// # Summary
    /// 向指定会话发送纯文本消息。
    ///
    /// # Logic
    /// 1. 根据目标平台要求封装消息。
    /// 2. 通过底层传输协议发送消息。
    ///
    /// # Arguments
    /// * `chat_id` - 目标会话。
    /// * `text` - 消息正文。
    ///
    /// # Returns
    /// * 成功返回 `Ok(())`。
    /// * 失败返回 `Err(NotifyError)`。
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), NotifyError>;
}

/// # Summary
/// 聊天指令处理接口，由持有订阅者集合的一方实现。
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// # Summary
    /// 处理来自某个会话的指令。
    ///
    /// # Arguments
    /// * `chat_id` - 发出指令的会话。
    /// * `command` - 已解析的指令。
    ///
    /// # Returns
    /// 需要按顺序回复给该会话的消息，可以为空。
    async fn handle(&self, chat_id: ChatId, command: ChatCommand) -> Vec<String>;
}
