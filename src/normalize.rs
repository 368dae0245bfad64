use serde_json::Value;
use tracing::warn;

use crate::error::NormalizeError;
use crate::models::Draw;
use crate::types::RawDraw;
use crate::utils::parse_lottery_date;

pub fn normalize_item(item: &Value) -> Result<Draw, NormalizeError> {
    let raw: RawDraw = serde_json::from_value(item.clone())?;

    let draw_date = parse_lottery_date(&raw.lottery_date)
        .ok_or_else(|| NormalizeError::Date(raw.lottery_date.clone()))?;

    let period = match &raw.period {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => return Err(NormalizeError::Period(other.to_string())),
    };

    Ok(Draw::new(period, draw_date, &raw.draw_number_appear)?)
}

/// Normalizes a month's worth of raw items, skipping the ones that don't parse.
pub fn normalize_batch(items: &[Value]) -> Vec<Draw> {
    items
        .iter()
        .filter_map(|item| match normalize_item(item) {
            Ok(draw) => Some(draw),
            Err(e) => {
                warn!("Skipping malformed draw: {} - Item: {}", e, item);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_normalize_item_numeric_period() {
        let item = json!({
            "lotteryDate": "2024-01-02T00:00:00",
            "period": 113000001,
            "drawNumberAppear": [33, 5, 18, 2, 27],
            "drawNumberSize": [2, 5, 18, 27, 33]
        });
        let draw = normalize_item(&item).unwrap();
        assert_eq!(draw.period(), "113000001");
        assert_eq!(draw.draw_date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(draw.numbers(), &[2, 5, 18, 27, 33]);
        assert_eq!(draw.display_date(), "113/01/02");
    }

    #[test]
    fn test_normalize_item_keeps_string_period_verbatim() {
        let item = json!({
            "lotteryDate": "2014-01-01T00:00:00",
            "period": "0103001",
            "drawNumberAppear": [1, 2, 3, 4, 5]
        });
        assert_eq!(normalize_item(&item).unwrap().period(), "0103001");
    }

    #[test]
    fn test_normalize_item_errors() {
        let missing_date = json!({ "period": 1, "drawNumberAppear": [1, 2, 3, 4, 5] });
        assert!(matches!(
            normalize_item(&missing_date),
            Err(NormalizeError::Shape(_))
        ));

        let bad_date = json!({
            "lotteryDate": "not a date",
            "period": 1,
            "drawNumberAppear": [1, 2, 3, 4, 5]
        });
        assert!(matches!(normalize_item(&bad_date), Err(NormalizeError::Date(_))));

        let short = json!({
            "lotteryDate": "2024-01-02T00:00:00",
            "period": 1,
            "drawNumberAppear": [1, 2, 3]
        });
        assert!(matches!(normalize_item(&short), Err(NormalizeError::Draw(_))));

        let null_period = json!({
            "lotteryDate": "2024-01-02T00:00:00",
            "period": null,
            "drawNumberAppear": [1, 2, 3, 4, 5]
        });
        assert!(matches!(
            normalize_item(&null_period),
            Err(NormalizeError::Period(_))
        ));
    }

    #[test]
    fn test_normalize_batch_skips_bad_items() {
        let items = vec![
            json!({ "lotteryDate": "2024-01-02T00:00:00", "period": 1, "drawNumberAppear": [1, 2, 3, 4, 5] }),
            json!({ "lotteryDate": "2024-01-03T00:00:00", "period": 2, "drawNumberAppear": [1, 1, 3, 4, 5] }),
            json!("garbage"),
            json!({ "lotteryDate": "2024-01-04T00:00:00", "period": 3, "drawNumberAppear": [9, 8, 7, 6, 39] }),
        ];
        let draws = normalize_batch(&items);
        let periods: Vec<&str> = draws.iter().map(|d| d.period()).collect();
        assert_eq!(periods, vec!["1", "3"]);
    }
}
