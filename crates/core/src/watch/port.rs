use crate::market::window::Window;
use crate::notify::port::ChatId;
use std::sync::Arc;

/// # Summary
/// 通知基线存储：每个证券最近一次用于通知（或首次播种）的时间窗口。
///
/// # Invariants
/// - 生命周期与进程一致，不做持久化。
/// - 首次出现的证券只播种，不参与比较。
/// - 只有触发了通知的证券才会替换基线。
pub trait BaselineStore: Send + Sync {
    /// 读取证券当前的基线
    fn baseline(&self, ticker: &str) -> Option<Arc<Window>>;

    /// # Summary
    /// 若该证券尚无基线，则以给定窗口播种。
    ///
    /// # Returns
    /// 本次完成播种返回 true，已有基线时保持不变并返回 false。
    fn seed(&self, window: Arc<Window>) -> bool;

    /// 通知已发出，用新窗口替换基线
    fn rearm(&self, window: Arc<Window>);

    /// 已有基线的证券代码
    fn tickers(&self) -> Vec<String>;

    /// 进程退出前清空全部基线
    fn clear(&self);
}

/// # Summary
/// 订阅者集合。
///
/// # Invariants
/// - 订阅与退订可以与投递并发进行，投递方只读取快照。
pub trait SubscriberStore: Send + Sync {
    /// 新增订阅，已存在时返回 false
    fn subscribe(&self, chat_id: ChatId) -> bool;

    /// 取消订阅，本就不存在时返回 false
    fn unsubscribe(&self, chat_id: ChatId) -> bool;

    /// 当前订阅者的快照
    fn snapshot(&self) -> Vec<ChatId>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
