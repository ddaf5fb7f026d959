use crate::market::error::WindowError;
use crate::market::window::{TRAILING_OFFSETS, Window};

/// 回撤百分比相对基线下降超过该值（严格小于）才视为恶化。
pub const WORSENING_THRESHOLD: f64 = -2.0;

/// # Summary
/// 单个回溯周期上新旧窗口的回撤对比结果。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetDiff {
    // 回溯天数
    pub days: u32,
    // 新窗口在该周期的回撤百分比
    pub new_percent: f64,
    // 基线窗口在该周期的回撤百分比
    pub old_percent: f64,
    // new_percent - old_percent
    pub diff: f64,
}

impl OffsetDiff {
    pub fn is_worsened(&self) -> bool {
        self.diff < WORSENING_THRESHOLD
    }
}

/// # Summary
/// 在全部回溯周期上比较新窗口与基线窗口。
///
/// # Logic
/// 1. 对 `TRAILING_OFFSETS` 中的每个天数分别截取新旧子窗口。
/// 2. 计算两者回撤百分比之差，各周期互不影响。
///
/// # Arguments
/// * `new`: 本轮抓取得到的窗口。
/// * `previous`: 同一证券的基线窗口。
///
/// # Returns
/// 按 `TRAILING_OFFSETS` 顺序排列的对比结果。纯函数，不修改任何状态。
pub fn compare(new: &Window, previous: &Window) -> Result<Vec<OffsetDiff>, WindowError> {
    TRAILING_OFFSETS
        .iter()
        .map(|&days| {
            let new_percent = new.sub_window(days)?.drawdown_percent();
            let old_percent = previous.sub_window(days)?.drawdown_percent();
            Ok(OffsetDiff {
                days,
                new_percent,
                old_percent,
                diff: new_percent - old_percent,
            })
        })
        .collect()
}

/// 只保留恶化的周期；任一周期恶化即应重新布防该证券的基线。
pub fn worsened(new: &Window, previous: &Window) -> Result<Vec<OffsetDiff>, WindowError> {
    Ok(compare(new, previous)?
        .into_iter()
        .filter(OffsetDiff::is_worsened)
        .collect())
}
