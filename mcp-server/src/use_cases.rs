use anyhow::Result;
use chrono::Local;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

use daily539::config::FetchConfig;
use daily539::prompt::{AnalysisDigest, DEFAULT_WINDOW};
use daily539::{Fetcher, StatsEngine, UpdateOutcome, update_draws};

const DEFAULT_LATEST_COUNT: usize = 5;

/// A tool argument that is present but unusable. Reported as invalid params.
#[derive(Debug, Error)]
#[error("invalid argument '{name}': expected a non-negative integer, got {value}")]
pub struct InvalidArgument {
    pub name: &'static str,
    pub value: Value,
}

/// Absent or `null` is `None`; anything but a non-negative integer is rejected.
fn count_argument(arguments: &HashMap<String, Value>, name: &'static str) -> Result<Option<usize>> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => match value.as_u64() {
            Some(n) => Ok(Some(n as usize)),
            None => Err(InvalidArgument {
                name,
                value: value.clone(),
            }
            .into()),
        },
    }
}

fn num_draws(arguments: &HashMap<String, Value>) -> Result<Option<usize>> {
    count_argument(arguments, "num_draws")
}

fn count_map<K: ToString>(counts: impl IntoIterator<Item = (K, u32)>) -> serde_json::Map<String, Value> {
    counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect()
}

/// Read-only statistics queries. Every call reloads the table so it sees the
/// latest update.
pub struct StatsUseCase {
    data_path: PathBuf,
}

impl StatsUseCase {
    pub fn new(data_path: PathBuf) -> Self {
        Self { data_path }
    }

    fn engine(&self) -> Result<StatsEngine> {
        Ok(StatsEngine::load(&self.data_path)?)
    }

    pub async fn get_latest_draws(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let count = count_argument(arguments, "count")?.unwrap_or(DEFAULT_LATEST_COUNT);

        let engine = self.engine()?;
        let draws: Vec<Value> = engine
            .latest_n_draws(count)
            .iter()
            .map(|d| {
                json!({
                    "period": d.period(),
                    "draw_date": d.draw_date(),
                    "display_date": d.display_date(),
                    "numbers": d.numbers(),
                })
            })
            .collect();

        Ok(json!({
            "success": true,
            "results": draws
        })
        .to_string())
    }

    pub async fn get_overview(&self, _arguments: &HashMap<String, Value>) -> Result<String> {
        let overview = self.engine()?.overview();
        Ok(json!({
            "success": true,
            "result": overview
        })
        .to_string())
    }

    pub async fn get_frequency(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let frequency = self.engine()?.frequency(num_draws(arguments)?);
        Ok(json!({
            "success": true,
            "frequency": count_map(frequency)
        })
        .to_string())
    }

    pub async fn get_sum_analysis(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let sums = self.engine()?.sum_analysis(num_draws(arguments)?);
        Ok(json!({
            "success": true,
            "result": sums
        })
        .to_string())
    }

    pub async fn get_ratio_analysis(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let ratios = self.engine()?.ratio_analysis(num_draws(arguments)?);
        let odd_even_ratios: Vec<String> = ratios.odd_even_ratios.iter().map(|r| r.to_string()).collect();
        let big_small_ratios: Vec<String> = ratios.big_small_ratios.iter().map(|r| r.to_string()).collect();

        Ok(json!({
            "success": true,
            "odd_even_ratios": odd_even_ratios,
            "big_small_ratios": big_small_ratios,
            "odd_even_distribution": count_map(ratios.odd_even_distribution.iter().map(|(k, v)| (k.label(), *v))),
            "big_small_distribution": count_map(ratios.big_small_distribution.iter().map(|(k, v)| (k.label(), *v))),
        })
        .to_string())
    }

    pub async fn get_consecutive_analysis(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let consecutive = self.engine()?.consecutive_analysis(num_draws(arguments)?);
        Ok(json!({
            "success": true,
            "consecutive_patterns": count_map(consecutive.patterns),
            "total_draws_with_consecutive": consecutive.draws_with_consecutive,
            "percentage_with_consecutive": consecutive.percentage_with_consecutive,
        })
        .to_string())
    }

    pub async fn get_last_digits(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let digits = self.engine()?.last_digits(num_draws(arguments)?);
        Ok(json!({
            "success": true,
            "last_digits": count_map(digits)
        })
        .to_string())
    }

    pub async fn get_analysis_prompt(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let window = num_draws(arguments)?.unwrap_or(DEFAULT_WINDOW);
        let digest = AnalysisDigest::build(&self.engine()?, window)
            .ok_or_else(|| anyhow::anyhow!("No draw data available; run update_draws first"))?;

        Ok(json!({
            "success": true,
            "digest": digest,
            "prompt": digest.render_prompt()
        })
        .to_string())
    }
}

pub struct UpdateUseCase {
    data_path: PathBuf,
    fetch: FetchConfig,
}

impl UpdateUseCase {
    pub fn new(data_path: PathBuf, fetch: FetchConfig) -> Self {
        Self { data_path, fetch }
    }

    pub async fn update_draws(&self, _arguments: &HashMap<String, Value>) -> Result<String> {
        let fetcher = Fetcher::new(&self.fetch)?;
        let today = Local::now().date_naive();
        let outcome = update_draws(&self.data_path, &fetcher, &self.fetch, today).await?;

        let result = match outcome {
            UpdateOutcome::Updated { added, total } => json!({
                "status": "updated", "added": added, "total": total
            }),
            UpdateOutcome::UpToDate { total } => json!({
                "status": "up_to_date", "added": 0, "total": total
            }),
            UpdateOutcome::NoData => json!({
                "status": "no_data", "added": 0, "total": 0
            }),
        };

        Ok(json!({
            "success": true,
            "result": result
        })
        .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use daily539::{Draw, DrawTable};
    use tempfile::TempDir;

    fn use_case(dir: &TempDir) -> StatsUseCase {
        let path = dir.path().join("lottery_data.csv");
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        DrawTable::new(vec![
            Draw::new("1", day(1), &[1, 2, 3, 4, 5]).unwrap(),
            Draw::new("2", day(2), &[10, 11, 20, 21, 39]).unwrap(),
            Draw::new("3", day(3), &[2, 4, 6, 8, 10]).unwrap(),
        ])
        .save(&path)
        .unwrap();
        StatsUseCase::new(path)
    }

    fn parse(raw: String) -> Value {
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_frequency_window() {
        let dir = TempDir::new().unwrap();
        let args = HashMap::from([("num_draws".to_string(), json!(2))]);
        let result = parse(use_case(&dir).get_frequency(&args).await.unwrap());

        let frequency = result["frequency"].as_object().unwrap();
        assert_eq!(frequency.len(), 39);
        assert_eq!(frequency["10"], 2);
        assert_eq!(frequency["1"], 0);
    }

    #[tokio::test]
    async fn test_ratio_labels() {
        let dir = TempDir::new().unwrap();
        let result = parse(use_case(&dir).get_ratio_analysis(&HashMap::new()).await.unwrap());
        assert_eq!(result["odd_even_distribution"]["3奇2偶"], 2);
        assert_eq!(result["big_small_distribution"]["0大5小"], 2);
        assert_eq!(result["odd_even_ratios"][1], "3:2");
    }

    #[tokio::test]
    async fn test_latest_draws_default_count() {
        let dir = TempDir::new().unwrap();
        let result = parse(use_case(&dir).get_latest_draws(&HashMap::new()).await.unwrap());
        let draws = result["results"].as_array().unwrap();
        assert_eq!(draws.len(), 3);
        assert_eq!(draws[2]["period"], "3");
        assert_eq!(draws[2]["draw_date"], "2024-01-03");
    }

    #[tokio::test]
    async fn test_prompt_without_data_is_an_error() {
        let dir = TempDir::new().unwrap();
        let use_case = StatsUseCase::new(dir.path().join("missing.csv"));
        assert!(use_case.get_analysis_prompt(&HashMap::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_window_is_rejected() {
        let dir = TempDir::new().unwrap();
        let use_case = use_case(&dir);

        for bad in [json!(-3), json!(2.5), json!("10")] {
            let args = HashMap::from([("num_draws".to_string(), bad)]);
            let err = use_case.get_frequency(&args).await.unwrap_err();
            assert!(err.downcast_ref::<InvalidArgument>().is_some());
        }

        let args = HashMap::from([("count".to_string(), json!(-1))]);
        let err = use_case.get_latest_draws(&args).await.unwrap_err();
        assert!(err.downcast_ref::<InvalidArgument>().is_some());
    }

    #[tokio::test]
    async fn test_null_window_means_all_draws() {
        let dir = TempDir::new().unwrap();
        let args = HashMap::from([("num_draws".to_string(), Value::Null)]);
        let result = parse(use_case(&dir).get_frequency(&args).await.unwrap());
        assert_eq!(result["frequency"]["2"], 2);
    }
}
