use serde::Serialize;
use std::collections::BTreeMap;

use crate::stats::StatsEngine;

pub const DEFAULT_WINDOW: usize = 30;
const HOT_COLD_COUNT: usize = 5;
const HOT_DIGIT_COUNT: usize = 3;

/// Condensed view of the recent window, the part of the statistics the
/// language model gets to see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisDigest {
    pub num_draws: usize,
    pub hot_numbers: Vec<u8>,
    pub cold_numbers: Vec<u8>,
    pub mean_sum: f64,
    pub min_sum: u32,
    pub max_sum: u32,
    pub common_odd_even: String,
    pub common_big_small: String,
    pub draws_with_consecutive: usize,
    pub percentage_with_consecutive: f64,
    pub hot_last_digits: Vec<u8>,
}

impl AnalysisDigest {
    /// `None` when there are no draws to summarize.
    pub fn build(engine: &StatsEngine, num_draws: usize) -> Option<Self> {
        if engine.is_empty() {
            return None;
        }
        let window = Some(num_draws);

        let (cold_numbers, hot_numbers) = hot_and_cold(&engine.frequency(window));

        let sums = engine.sum_analysis(window);
        let ratios = engine.ratio_analysis(window);
        let consecutive = engine.consecutive_analysis(window);

        let mut digits: Vec<(u8, u32)> = engine.last_digits(window).into_iter().collect();
        digits.sort_by(|a, b| b.1.cmp(&a.1));

        Some(Self {
            num_draws,
            hot_numbers,
            cold_numbers,
            mean_sum: sums.mean?,
            min_sum: sums.min?,
            max_sum: sums.max?,
            common_odd_even: first_max(&ratios.odd_even_distribution)?.label(),
            common_big_small: first_max(&ratios.big_small_distribution)?.label(),
            draws_with_consecutive: consecutive.draws_with_consecutive,
            percentage_with_consecutive: consecutive.percentage_with_consecutive,
            hot_last_digits: digits.iter().take(HOT_DIGIT_COUNT).map(|(d, _)| *d).collect(),
        })
    }

    pub fn render_prompt(&self) -> String {
        let n = self.num_draws;
        format!(
            r#"
您是一位專業的樂透數據分析師，專精於「今彩539」。請根據以下最近 {n} 期的統計數據，提供您的專業分析與見解。請用繁體中文回答。

--- 數據摘要 (最近 {n} 期) ---
- **熱門號碼 (出現最多次)**: {hot}
- **冷門號碼 (出現最少次)**: {cold}
- **和值趨勢**: 平均和值為 {mean:.2}，近期和值在 {min} 到 {max} 之間波動。
- **奇偶比趨勢**: 最常見的奇偶比為「{odd_even}」。
- **大小比趨勢** (1-19為小, 20-39為大): 最常見的大小比為「{big_small}」。
- **連號趨勢**: 最近 {n} 期中，有 {consecutive} 期出現連號，佔比約 {percentage:.2}%。
- **尾數趨勢**: 最熱門的尾數為 {digits}。

--- 分析任務 ---
請根據以上數據，完成以下三項任務：

1.  **總結趨勢**: 請用 2-3 句話，以專業且易懂的方式，總結近期的主要趨勢。
2.  **提供建議**: 基於「排除低機率極端組合」的原則（例如，避免全奇/全偶、全大/全小、和值過高/過低），並結合上述數據，請提供 2 組 (每組 5 個號碼) 具有參考價值的選號建議。
3.  **說明理由**: 簡要說明您提供這 2 組號碼的理由，例如您是如何平衡熱門/冷門號碼，或如何考慮奇偶/大小比的。
"#,
            hot = join_padded(&self.hot_numbers),
            cold = join_padded(&self.cold_numbers),
            mean = self.mean_sum,
            min = self.min_sum,
            max = self.max_sum,
            odd_even = self.common_odd_even,
            big_small = self.common_big_small,
            consecutive = self.draws_with_consecutive,
            percentage = self.percentage_with_consecutive,
            digits = self
                .hot_last_digits
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

/// Sorts by count ascending (ties stay in number order) and returns the
/// bottom and top five.
fn hot_and_cold(frequency: &BTreeMap<u8, u32>) -> (Vec<u8>, Vec<u8>) {
    let mut by_count: Vec<(u8, u32)> = frequency.iter().map(|(n, c)| (*n, *c)).collect();
    by_count.sort_by_key(|(_, c)| *c);

    let cold = by_count.iter().take(HOT_COLD_COUNT).map(|(n, _)| *n).collect();
    let hot = by_count
        .iter()
        .skip(by_count.len().saturating_sub(HOT_COLD_COUNT))
        .map(|(n, _)| *n)
        .collect();
    (cold, hot)
}

/// Key with the highest count; on ties the first in key order wins.
fn first_max<K: Copy>(distribution: &BTreeMap<K, u32>) -> Option<K> {
    let mut best: Option<(K, u32)> = None;
    for (key, count) in distribution {
        if best.is_none_or(|(_, c)| *count > c) {
            best = Some((*key, *count));
        }
    }
    best.map(|(k, _)| k)
}

fn join_padded(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:02}", n))
        .collect::<Vec<_>>()
        .join(", ")
}
