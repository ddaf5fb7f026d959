/// # Summary
/// 聊天端可以发出的指令。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    // 订阅回撤通知，并立即收到当前概览
    Subscribe,
    // 取消订阅
    Unsubscribe,
}
