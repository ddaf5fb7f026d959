use crate::format::{describe, sort_by_half_year, summary, worsened_line};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dipwatch_core::common::Stock;
use dipwatch_core::common::time::{RealTimeProvider, TimeProvider};
use dipwatch_core::market::error::{MarketError, WindowError};
use dipwatch_core::market::port::MarketDataProvider;
use dipwatch_core::market::window::Window;
use dipwatch_core::notify::entity::ChatCommand;
use dipwatch_core::notify::port::{ChatId, CommandHandler, Notifier};
use dipwatch_core::watch::compare::worsened;
use dipwatch_core::watch::port::{BaselineStore, SubscriberStore};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// # Summary
/// 单个证券本轮被跳过的原因。
#[derive(Error, Debug)]
pub enum FetchFailure {
    #[error("fetch failed: {0}")]
    Market(#[from] MarketError),
    #[error("unusable candles: {0}")]
    Window(#[from] WindowError),
}

/// # Summary
/// 一轮抓取-比较-通知的执行结果。
#[derive(Debug, Default, Clone)]
pub struct CycleReport {
    // 成功构造窗口的证券
    pub fetched: Vec<String>,
    // 被跳过的证券及原因
    pub failed: Vec<(String, String)>,
    // 首次出现、仅播种基线的证券
    pub seeded: Vec<String>,
    // 恶化通知的各行
    pub lines: Vec<String>,
    // 本轮替换了基线的证券
    pub rearmed: Vec<String>,
    // 成功投递的订阅者数量
    pub delivered: usize,
}

impl CycleReport {
    /// 合并后的通知正文，没有恶化时为 None
    pub fn message(&self) -> Option<String> {
        (!self.lines.is_empty()).then(|| self.lines.join("\n"))
    }
}

/// # Summary
/// 回撤监控的编排者，系统的应用服务层门面。
/// 编译期仅依赖 `dipwatch-core` 中的 Trait 定义，所有具体实现通过构造函数注入。
///
/// # Invariants
/// - 同一时刻最多只有一轮 `run_cycle` 在执行（`cycle_lock`）。
/// - 基线只在持有 `cycle_lock` 时修改。
/// - 订阅者集合可随时变化，投递时读取快照。
pub struct Watcher {
    // 关注的证券，按配置顺序
    stocks: Vec<Stock>,
    // 每次抓取的回溯跨度
    lookback: ChronoDuration,
    // 行情数据源
    provider: Arc<dyn MarketDataProvider>,
    // 消息投递通道
    notifier: Arc<dyn Notifier>,
    // 通知基线
    baselines: Arc<dyn BaselineStore>,
    // 订阅者
    subscribers: Arc<dyn SubscriberStore>,
    // 时钟
    clock: Arc<dyn TimeProvider>,
    // 最近一轮成功的窗口，按 180 天回撤降序
    latest: RwLock<Vec<Arc<Window>>>,
    // 单飞锁
    cycle_lock: Mutex<()>,
}

impl Watcher {
    /// # Summary
    /// 创建 Watcher 实例，默认使用系统时钟。
    ///
    /// # Arguments
    /// * `stocks` - 关注清单。
    /// * `lookback_days` - 每次抓取回溯的天数。
    /// * `provider` - 行情数据源的具体实现。
    /// * `notifier` - 消息投递的具体实现。
    /// * `baselines` - 通知基线存储。
    /// * `subscribers` - 订阅者集合。
    pub fn new(
        stocks: Vec<Stock>,
        lookback_days: u32,
        provider: Arc<dyn MarketDataProvider>,
        notifier: Arc<dyn Notifier>,
        baselines: Arc<dyn BaselineStore>,
        subscribers: Arc<dyn SubscriberStore>,
    ) -> Self {
        Self {
            stocks,
            lookback: ChronoDuration::days(i64::from(lookback_days)),
            provider,
            notifier,
            baselines,
            subscribers,
            clock: Arc::new(RealTimeProvider),
            latest: RwLock::new(Vec::new()),
            cycle_lock: Mutex::new(()),
        }
    }

    /// 替换时钟，测试中用于固定抓取区间
    pub fn with_clock(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = clock;
        self
    }

    /// # Summary
    /// 按固定间隔循环执行，首轮立即开始。
    ///
    /// # Logic
    /// 1. 使用 `MissedTickBehavior::Delay`，上一轮超时不会导致补跑堆积。
    /// 2. 每轮结束后才等待下一个 tick，轮次之间不重叠。
    pub async fn run(self: Arc<Self>, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Watcher started for {} tickers, every {:?}", self.stocks.len(), every);

        loop {
            ticker.tick().await;
            let report = self.run_cycle().await;
            info!(
                fetched = report.fetched.len(),
                failed = report.failed.len(),
                seeded = report.seeded.len(),
                worsened = report.lines.len(),
                delivered = report.delivered,
                "Cycle finished"
            );
        }
    }

    /// # Summary
    /// 执行一轮完整的抓取-比较-通知。
    ///
    /// # Logic
    /// 1. 获取单飞锁。
    /// 2. 并发抓取全部证券，单个失败只记录日志并跳过。
    /// 3. 有基线的证券与基线比较，收集恶化行；没有基线的证券只播种。
    /// 4. 存在恶化行时合并为一条消息，投递给订阅者快照。
    /// 5. 仅替换触发了通知的证券的基线。
    /// 6. 刷新最近一轮窗口快照供概览使用。
    ///
    /// # Returns
    /// 本轮的 `CycleReport`。该方法本身不会失败。
    pub async fn run_cycle(&self) -> CycleReport {
        let _guard = self.cycle_lock.lock().await;

        let end = self.clock.now();
        let start = end - self.lookback;

        let outcomes = join_all(self.stocks.iter().map(|stock| async move {
            (stock, self.fetch_window(stock, start, end).await)
        }))
        .await;

        let mut report = CycleReport::default();
        let mut windows = Vec::with_capacity(outcomes.len());
        for (stock, outcome) in outcomes {
            match outcome {
                Ok(window) => {
                    report.fetched.push(stock.symbol.clone());
                    windows.push(window);
                }
                Err(e) => {
                    warn!("Skipping {} this cycle: {}", stock, e);
                    report.failed.push((stock.symbol.clone(), e.to_string()));
                }
            }
        }

        let mut triggered = Vec::new();
        for window in &windows {
            let Some(baseline) = self.baselines.baseline(window.ticker()) else {
                if self.baselines.seed(window.clone()) {
                    report.seeded.push(window.ticker().to_string());
                }
                continue;
            };

            match worsened(window, &baseline) {
                Ok(diffs) if !diffs.is_empty() => {
                    report
                        .lines
                        .extend(diffs.iter().map(|diff| worsened_line(window.ticker(), diff)));
                    triggered.push(window.clone());
                }
                Ok(_) => {}
                Err(e) => warn!("Cannot compare {}: {}", window.ticker(), e),
            }
        }

        if let Some(message) = report.message() {
            report.delivered = self.broadcast(&message).await;
        }

        for window in triggered {
            report.rearmed.push(window.ticker().to_string());
            self.baselines.rearm(window);
        }

        let sorted = sort_by_half_year(&windows);
        for window in &sorted {
            debug!("{}", describe(window));
        }
        *self.latest.write().await = sorted;

        report
    }

    async fn fetch_window(
        &self,
        stock: &Stock,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Arc<Window>, FetchFailure> {
        let candles = self.provider.fetch_candles(stock, start, end).await?;
        Ok(Arc::new(Window::new(stock.symbol.clone(), candles)?))
    }

    /// # Summary
    /// 将消息发给当前订阅者快照中的每一个会话。
    ///
    /// # Returns
    /// 投递成功的会话数量。单个会话失败只记录日志。
    async fn broadcast(&self, message: &str) -> usize {
        let mut delivered = 0;
        for chat_id in self.subscribers.snapshot() {
            match self.notifier.send_text(chat_id, message).await {
                Ok(()) => delivered += 1,
                Err(e) => error!(chat_id = chat_id, "Delivery failed: {}", e),
            }
        }
        delivered
    }

    /// 最近一轮窗口的概览，尚未完成任何一轮时为 None
    pub async fn summary(&self) -> Option<String> {
        summary(&self.latest.read().await)
    }

    /// # Summary
    /// 进程退出前释放基线与快照。
    ///
    /// # Logic
    /// 等待进行中的一轮结束后再清空，避免与其交错。
    pub async fn shutdown(&self) {
        let _guard = self.cycle_lock.lock().await;
        self.baselines.clear();
        self.latest.write().await.clear();
        info!("Watcher state cleared");
    }
}

#[async_trait]
impl CommandHandler for Watcher {
    /// # Summary
    /// 处理订阅与退订。
    ///
    /// # Logic
    /// 1. 订阅：加入集合，回复确认，若已有数据则附带概览。
    /// 2. 退订：移出集合并回复确认。
    async fn handle(&self, chat_id: ChatId, command: ChatCommand) -> Vec<String> {
        match command {
            ChatCommand::Subscribe => {
                if self.subscribers.subscribe(chat_id) {
                    info!(chat_id = chat_id, "Subscriber added");
                }
                let mut replies = vec!["Subscribing".to_string()];
                replies.extend(self.summary().await);
                replies
            }
            ChatCommand::Unsubscribe => {
                if self.subscribers.unsubscribe(chat_id) {
                    info!(chat_id = chat_id, "Subscriber removed");
                }
                vec!["Unsubscribing".to_string()]
            }
        }
    }
}
