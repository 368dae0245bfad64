use chrono::{Datelike, NaiveDate};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }
}

/// `2024-01`, the form the results API expects.
impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Every month from `start` through `end`, inclusive. Empty if `start` is later.
pub fn months_through(start: YearMonth, end: YearMonth) -> Vec<YearMonth> {
    let mut months = Vec::new();
    let mut current = start;
    while current <= end {
        months.push(current);
        current = current.next();
    }
    months
}

/// Lottery dates arrive as `2024-01-02T00:00:00`; only the date part matters.
pub fn parse_lottery_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().split('T').next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_months_through_wraps_year() {
        let months = months_through(YearMonth::new(2023, 11), YearMonth::new(2024, 2));
        let labels: Vec<String> = months.iter().map(|m| m.to_string()).collect();
        assert_eq!(labels, vec!["2023-11", "2023-12", "2024-01", "2024-02"]);
    }

    #[test]
    fn test_months_through_single_and_empty() {
        assert_eq!(
            months_through(YearMonth::new(2024, 5), YearMonth::new(2024, 5)).len(),
            1
        );
        assert!(months_through(YearMonth::new(2024, 6), YearMonth::new(2024, 5)).is_empty());
    }

    #[test]
    fn test_parse_lottery_date() {
        assert_eq!(
            parse_lottery_date("2024-01-02T00:00:00"),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
        assert_eq!(
            parse_lottery_date("2014-12-31"),
            NaiveDate::from_ymd_opt(2014, 12, 31)
        );
        assert_eq!(parse_lottery_date("2024/01/02"), None);
        assert_eq!(parse_lottery_date(""), None);
    }
}
