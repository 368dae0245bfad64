//! Descriptive statistics over the draw table.
//!
//! Every query takes an optional window: `Some(n)` restricts it to the `n`
//! most recent draws, `None` covers the whole history. Empty tables and empty
//! windows produce neutral results (zero counts, `None` scalars), never errors.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::StoreError;
use crate::models::{Draw, MAX_NUMBER, MIN_NUMBER, PICK_COUNT, is_small};
use crate::store::DrawTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OddEven {
    pub odd: u8,
    pub even: u8,
}

impl OddEven {
    pub fn of(draw: &Draw) -> Self {
        let odd = draw.numbers().iter().filter(|&&n| n % 2 == 1).count() as u8;
        Self {
            odd,
            even: PICK_COUNT as u8 - odd,
        }
    }

    /// `3奇2偶`
    pub fn label(&self) -> String {
        format!("{}奇{}偶", self.odd, self.even)
    }
}

/// `3:2`, odd first.
impl fmt::Display for OddEven {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.odd, self.even)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BigSmall {
    pub big: u8,
    pub small: u8,
}

impl BigSmall {
    pub fn of(draw: &Draw) -> Self {
        let small = draw.numbers().iter().filter(|&&n| is_small(n)).count() as u8;
        Self {
            big: PICK_COUNT as u8 - small,
            small,
        }
    }

    /// `3大2小`
    pub fn label(&self) -> String {
        format!("{}大{}小", self.big, self.small)
    }
}

/// `3:2`, big first.
impl fmt::Display for BigSmall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.big, self.small)
    }
}

/// Two numbers of one draw that differ by exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConsecutivePair {
    pub low: u8,
    pub high: u8,
}

impl ConsecutivePair {
    pub fn in_draw(draw: &Draw) -> Vec<Self> {
        draw.numbers()
            .windows(2)
            .filter(|w| w[1] - w[0] == 1)
            .map(|w| Self {
                low: w[0],
                high: w[1],
            })
            .collect()
    }
}

/// `12,13`
impl fmt::Display for ConsecutivePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02},{:02}", self.low, self.high)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SumAnalysis {
    pub sums: Vec<u32>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<u32>,
    pub max: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RatioAnalysis {
    pub odd_even_ratios: Vec<OddEven>,
    pub big_small_ratios: Vec<BigSmall>,
    pub odd_even_distribution: BTreeMap<OddEven, u32>,
    pub big_small_distribution: BTreeMap<BigSmall, u32>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConsecutiveAnalysis {
    pub patterns: BTreeMap<ConsecutivePair, u32>,
    pub draws_with_consecutive: usize,
    pub percentage_with_consecutive: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub total_draws: usize,
    pub earliest_date: Option<NaiveDate>,
    pub latest_date: Option<NaiveDate>,
}

/// Read-only view over a loaded table. Reload by building a new engine.
#[derive(Debug, Clone, Default)]
pub struct StatsEngine {
    table: DrawTable,
}

impl StatsEngine {
    pub fn new(table: DrawTable) -> Self {
        Self { table }
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(DrawTable::load(path)?))
    }

    pub fn table(&self) -> &DrawTable {
        &self.table
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The `n` most recent draws, oldest first.
    pub fn latest_n_draws(&self, n: usize) -> &[Draw] {
        let draws = self.table.draws();
        &draws[draws.len().saturating_sub(n)..]
    }

    fn window(&self, num_draws: Option<usize>) -> &[Draw] {
        match num_draws {
            Some(n) => self.latest_n_draws(n),
            None => self.table.draws(),
        }
    }

    pub fn overview(&self) -> Overview {
        Overview {
            total_draws: self.table.len(),
            earliest_date: self.table.earliest_date(),
            latest_date: self.table.latest_date(),
        }
    }

    /// Appearances of every number 1-39.
    pub fn frequency(&self, num_draws: Option<usize>) -> BTreeMap<u8, u32> {
        let mut counts: BTreeMap<u8, u32> = (MIN_NUMBER..=MAX_NUMBER).map(|n| (n, 0)).collect();
        for draw in self.window(num_draws) {
            for n in draw.numbers() {
                *counts.entry(*n).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn sum_analysis(&self, num_draws: Option<usize>) -> SumAnalysis {
        let sums: Vec<u32> = self.window(num_draws).iter().map(Draw::sum).collect();

        SumAnalysis {
            mean: mean(&sums),
            median: median(&sums),
            std_dev: sample_std_dev(&sums),
            min: sums.iter().copied().min(),
            max: sums.iter().copied().max(),
            sums,
        }
    }

    pub fn ratio_analysis(&self, num_draws: Option<usize>) -> RatioAnalysis {
        let mut analysis = RatioAnalysis::default();

        for draw in self.window(num_draws) {
            let odd_even = OddEven::of(draw);
            analysis.odd_even_ratios.push(odd_even);
            *analysis.odd_even_distribution.entry(odd_even).or_insert(0) += 1;

            let big_small = BigSmall::of(draw);
            analysis.big_small_ratios.push(big_small);
            *analysis.big_small_distribution.entry(big_small).or_insert(0) += 1;
        }

        analysis
    }

    pub fn consecutive_analysis(&self, num_draws: Option<usize>) -> ConsecutiveAnalysis {
        let window = self.window(num_draws);
        let mut analysis = ConsecutiveAnalysis::default();

        for draw in window {
            let pairs = ConsecutivePair::in_draw(draw);
            if !pairs.is_empty() {
                analysis.draws_with_consecutive += 1;
            }
            for pair in pairs {
                *analysis.patterns.entry(pair).or_insert(0) += 1;
            }
        }

        if !window.is_empty() {
            analysis.percentage_with_consecutive =
                analysis.draws_with_consecutive as f64 / window.len() as f64 * 100.0;
        }
        analysis
    }

    /// Appearances of every last digit 0-9.
    pub fn last_digits(&self, num_draws: Option<usize>) -> BTreeMap<u8, u32> {
        let mut counts: BTreeMap<u8, u32> = (0..=9).map(|d| (d, 0)).collect();
        for draw in self.window(num_draws) {
            for n in draw.numbers() {
                *counts.entry(n % 10).or_insert(0) += 1;
            }
        }
        counts
    }
}

fn mean(values: &[u32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64)
}

fn median(values: &[u32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0)
    } else {
        Some(sorted[mid] as f64)
    }
}

/// Sample standard deviation (n - 1); undefined below two values.
fn sample_std_dev(values: &[u32]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    Some(variance.sqrt())
}
