use dipwatch_core::market::window::{TRAILING_OFFSETS, Window};
use dipwatch_core::watch::compare::OffsetDiff;
use std::sync::Arc;

/// 恶化通知中的一行：代码、周期、基线回撤、最新回撤。
pub fn worsened_line(ticker: &str, diff: &OffsetDiff) -> String {
    format!(
        "{:<5.5}\t{}d\told:{:2.1}\tnew:{:2.1}",
        ticker, diff.days, diff.old_percent, diff.new_percent
    )
}

/// 180 天回撤，用于所有面向用户的排序
pub fn half_year_percent(window: &Window) -> f64 {
    window
        .sub_window(180)
        .map_or(f64::NEG_INFINITY, |sub| sub.drawdown_percent())
}

/// # Summary
/// 按 180 天回撤降序排列（表现最好的在前）。
///
/// # Logic
/// 1. 先计算每个窗口的排序键，避免重复截取子窗口。
/// 2. 稳定排序，回撤相同时保持原有顺序。
pub fn sort_by_half_year(windows: &[Arc<Window>]) -> Vec<Arc<Window>> {
    let mut keyed: Vec<(f64, Arc<Window>)> = windows
        .iter()
        .map(|window| (half_year_percent(window), window.clone()))
        .collect();
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    keyed.into_iter().map(|(_, window)| window).collect()
}

/// 概览中的一行：代码后跟各回溯周期的回撤
pub fn summary_line(window: &Window) -> String {
    let percents: Vec<String> = TRAILING_OFFSETS
        .iter()
        .map(|&days| match window.sub_window(days) {
            Ok(sub) => format!("{:2.1}", sub.drawdown_percent()),
            Err(_) => "-".to_string(),
        })
        .collect();
    format!("{:<5.5}\t{}", window.ticker(), percents.join("\t"))
}

/// # Summary
/// 订阅时回复的概览，按 180 天回撤降序。
///
/// # Returns
/// 没有任何窗口时返回 None。
pub fn summary(windows: &[Arc<Window>]) -> Option<String> {
    if windows.is_empty() {
        return None;
    }
    let lines: Vec<String> = sort_by_half_year(windows)
        .iter()
        .map(|window| summary_line(window))
        .collect();
    Some(lines.join("\n"))
}

/// 日志用的单行描述：开盘、峰值、收盘及回撤
pub fn describe(window: &Window) -> String {
    let first = window.first();
    let peak = window.peak();
    let last = window.last();
    format!(
        "{} open:{:.2}({}) max:{:.2}({}) close:{:.2}({}) {:.2}%",
        window.ticker(),
        first.open,
        first.time,
        peak.high,
        peak.time,
        last.close,
        last.time,
        window.drawdown_percent()
    )
}
