use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use dipwatch_core::market::window::Window;
use dipwatch_core::notify::port::ChatId;
use dipwatch_core::watch::port::{BaselineStore, SubscriberStore};
use std::sync::Arc;
use tracing::debug;

/// # Summary
/// 基于 DashMap 的通知基线存储。
///
/// # Invariants
/// - 所有操作均通过并发哈希表 `DashMap` 执行，保证多线程安全。
/// - 窗口以 `Arc` 共享，存储本身不复制 K 线数据。
/// - 不做持久化，进程退出即丢失。
pub struct MemBaselineStore {
    // 证券代码 -> 基线窗口
    storage: DashMap<String, Arc<Window>>,
}

impl MemBaselineStore {
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
        }
    }
}

impl Default for MemBaselineStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BaselineStore for MemBaselineStore {
    fn baseline(&self, ticker: &str) -> Option<Arc<Window>> {
        self.storage.get(ticker).map(|entry| entry.value().clone())
    }

    /// # Summary
    /// 首次出现时播种基线。
    ///
    /// # Logic
    /// 通过 entry API 原子地检查并插入，已存在的基线不会被覆盖。
    fn seed(&self, window: Arc<Window>) -> bool {
        match self.storage.entry(window.ticker().to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                debug!("Seeding baseline for {}", window.ticker());
                slot.insert(window);
                true
            }
        }
    }

    fn rearm(&self, window: Arc<Window>) {
        debug!("Re-arming baseline for {}", window.ticker());
        self.storage.insert(window.ticker().to_string(), window);
    }

    fn tickers(&self) -> Vec<String> {
        self.storage.iter().map(|entry| entry.key().clone()).collect()
    }

    fn clear(&self) {
        self.storage.clear();
    }
}

/// # Summary
/// 基于 DashSet 的订阅者集合。
///
/// # Invariants
/// - 订阅、退订与快照读取可以并发发生。
/// - 快照只保证反映某个最近的有效状态。
pub struct MemSubscriberSet {
    // 已订阅的会话
    chats: DashSet<ChatId>,
}

impl MemSubscriberSet {
    pub fn new() -> Self {
        Self {
            chats: DashSet::new(),
        }
    }
}

impl Default for MemSubscriberSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriberStore for MemSubscriberSet {
    fn subscribe(&self, chat_id: ChatId) -> bool {
        self.chats.insert(chat_id)
    }

    fn unsubscribe(&self, chat_id: ChatId) -> bool {
        self.chats.remove(&chat_id).is_some()
    }

    fn snapshot(&self) -> Vec<ChatId> {
        self.chats.iter().map(|chat| *chat).collect()
    }

    fn len(&self) -> usize {
        self.chats.len()
    }
}
