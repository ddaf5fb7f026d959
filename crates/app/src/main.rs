use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, ensure};
use config::{Config, ConfigError, Environment, File, Source};
use dipwatch_cache::mem::{MemBaselineStore, MemSubscriberSet};
use dipwatch_core::config::AppConfig;
use dipwatch_feed::yahoo::YahooProvider;
use dipwatch_notify::bot::TelegramBot;
use dipwatch_notify::telegram::TelegramNotifier;
use dipwatch_watch::watcher::Watcher;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化所有具体实现组件并通过 Arc<dyn Trait> 注入到 Watcher 与 TelegramBot。
///
/// # Logic
/// 1. 加载 .env 并初始化全局日志。
/// 2. 加载配置。
/// 3. 实例化基础设施层（Feed、Notifier、内存存储）。
/// 4. 构造应用服务层（Watcher）并启动轮询与 Bot。
/// 5. 挂起等待外部信号，退出前清理状态。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing();
    info!("Dipwatch starting...");

    // 2. 加载配置
    let config = load_config(File::with_name("dipwatch").required(false))
        .context("Failed to load configuration")?;
    ensure!(config.watch.interval_secs > 0, "watch.interval_secs must be positive");
    let stocks = config.watch.stocks();
    ensure!(!stocks.is_empty(), "watch.tickers is empty");

    // 3. 实例化基础设施层
    let feed = Arc::new(YahooProvider::new(&config.feed)?);
    let notifier = Arc::new(TelegramNotifier::new(&config.telegram)?);
    let baselines = Arc::new(MemBaselineStore::new());
    let subscribers = Arc::new(MemSubscriberSet::new());

    // 4. 构造应用服务层（注入 Core Trait 抽象）
    let watcher = Arc::new(Watcher::new(
        stocks,
        config.watch.lookback_days,
        feed,
        notifier.clone(),
        baselines,
        subscribers,
    ));
    let bot = TelegramBot::new(&config.telegram, watcher.clone(), notifier)?;

    let polling = tokio::spawn(
        watcher
            .clone()
            .run(Duration::from_secs(config.watch.interval_secs)),
    );
    let chat = tokio::spawn(bot.run());

    info!("Watcher and bot running. Waiting for signals...");

    // 5. 挂起主线程，等待外部退出信号
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting...");

    polling.abort();
    chat.abort();
    watcher.shutdown().await;

    Ok(())
}

/// # Summary
/// 安装全局日志订阅者。
///
/// # Logic
/// 1. 过滤规则读取 `RUST_LOG`，缺省为 `info`。
/// 2. 通过非阻塞写入器输出到 stdout。
///
/// # Returns
/// 写入线程的守卫，必须存活到进程退出，否则缓冲日志会丢失。
fn init_tracing() -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true)
        .init();

    guard
}

/// # Summary
/// 按优先级叠加配置源：默认值 < 配置文件 < `DIPWATCH__*` 环境变量。
///
/// # Arguments
/// * `file` - 配置文件源，生产环境为可选的 `dipwatch.toml`。
///
/// # Returns
/// 反序列化后的 `AppConfig`，未出现的字段沿用默认值。
fn load_config<S>(file: S) -> Result<AppConfig, ConfigError>
where
    S: Source + Send + Sync + 'static,
{
    Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix("DIPWATCH")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("watch.tickers")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
