use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::DrawError;

pub const PICK_COUNT: usize = 5;
pub const MIN_NUMBER: u8 = 1;
pub const MAX_NUMBER: u8 = 39;
/// Numbers up to this value are "small", above it "big".
pub const SMALL_MAX: u8 = 19;
pub const PRIZE: u64 = 8_000_000;
pub const LOTTERY_TYPE: &str = "daily_cash";

/// Offset between the Gregorian year and the Minguo (ROC) year.
const ROC_YEAR_OFFSET: i32 = 1911;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Draw {
    period: String,
    draw_date: NaiveDate,
    numbers: [u8; PICK_COUNT],
}

impl Draw {
    /// Builds a draw from the first five raw numbers, sorted ascending.
    pub fn new(period: impl Into<String>, draw_date: NaiveDate, raw: &[i64]) -> Result<Self, DrawError> {
        let period = period.into();
        if period.trim().is_empty() {
            return Err(DrawError::EmptyPeriod);
        }
        if raw.len() < PICK_COUNT {
            return Err(DrawError::TooFewNumbers(raw.len()));
        }

        let mut numbers = [0u8; PICK_COUNT];
        for (slot, &value) in numbers.iter_mut().zip(raw.iter().take(PICK_COUNT)) {
            if value < MIN_NUMBER as i64 || value > MAX_NUMBER as i64 {
                return Err(DrawError::OutOfRange(value));
            }
            *slot = value as u8;
        }
        numbers.sort_unstable();

        if let Some(pair) = numbers.windows(2).find(|w| w[0] == w[1]) {
            return Err(DrawError::Duplicate(pair[0]));
        }

        Ok(Self {
            period,
            draw_date,
            numbers,
        })
    }

    pub fn period(&self) -> &str {
        &self.period
    }

    pub fn draw_date(&self) -> NaiveDate {
        self.draw_date
    }

    pub fn numbers(&self) -> &[u8; PICK_COUNT] {
        &self.numbers
    }

    pub fn sum(&self) -> u32 {
        self.numbers.iter().map(|&n| n as u32).sum()
    }

    /// ROC calendar date, e.g. `113/01/02` for 2024-01-02.
    pub fn display_date(&self) -> String {
        format!(
            "{}/{:02}/{:02}",
            self.draw_date.year() - ROC_YEAR_OFFSET,
            self.draw_date.month(),
            self.draw_date.day()
        )
    }

    /// `01,02,03,04,05`
    pub fn numbers_label(&self) -> String {
        self.numbers
            .iter()
            .map(|n| format!("{:02}", n))
            .collect::<Vec<_>>()
            .join(",")
    }
}

pub fn is_small(n: u8) -> bool {
    (MIN_NUMBER..=SMALL_MAX).contains(&n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_sorts_numbers() {
        let draw = Draw::new("113000001", date(2024, 1, 2), &[39, 4, 21, 1, 17]).unwrap();
        assert_eq!(draw.numbers(), &[1, 4, 17, 21, 39]);
        assert_eq!(draw.sum(), 82);
    }

    #[test]
    fn test_new_takes_first_five() {
        let draw = Draw::new("1", date(2024, 1, 2), &[5, 4, 3, 2, 1, 39]).unwrap();
        assert_eq!(draw.numbers(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert_eq!(
            Draw::new("1", date(2024, 1, 2), &[0, 2, 3, 4, 5]),
            Err(DrawError::OutOfRange(0))
        );
        assert_eq!(
            Draw::new("1", date(2024, 1, 2), &[1, 2, 3, 4, 40]),
            Err(DrawError::OutOfRange(40))
        );
    }

    #[test]
    fn test_new_rejects_duplicates_and_short_lists() {
        assert_eq!(
            Draw::new("1", date(2024, 1, 2), &[7, 2, 7, 4, 5]),
            Err(DrawError::Duplicate(7))
        );
        assert_eq!(
            Draw::new("1", date(2024, 1, 2), &[1, 2, 3]),
            Err(DrawError::TooFewNumbers(3))
        );
        assert_eq!(
            Draw::new(" ", date(2024, 1, 2), &[1, 2, 3, 4, 5]),
            Err(DrawError::EmptyPeriod)
        );
    }

    #[test]
    fn test_display_date_and_label() {
        let draw = Draw::new("0042", date(2014, 3, 7), &[9, 1, 30, 12, 2]).unwrap();
        assert_eq!(draw.display_date(), "103/03/07");
        assert_eq!(draw.numbers_label(), "01,02,09,12,30");
        assert_eq!(draw.period(), "0042");
    }

    #[test]
    fn test_is_small() {
        assert!(is_small(1));
        assert!(is_small(19));
        assert!(!is_small(20));
        assert!(!is_small(39));
    }
}
