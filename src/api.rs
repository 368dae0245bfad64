use chrono::NaiveDate;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::future::Future;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::FetchConfig;
use crate::error::{FetchError, StoreError};
use crate::normalize::normalize_batch;
use crate::store::{DrawTable, merge};
use crate::types::{DailyCashResponse, MonthQuery};
use crate::utils::{YearMonth, months_through};

const BROWSER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Anything that can hand back the raw draw items for one month.
pub trait DrawSource {
    /// Never fails: an unreachable month is an empty month.
    fn fetch_month(&self, month: YearMonth) -> impl Future<Output = Vec<Value>>;
}

pub struct Fetcher {
    client: reqwest::Client,
    base_url: String,
    page_size: u32,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-TW,zh;q=0.9,en;q=0.8"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
        })
    }

    async fn request_month(&self, month: YearMonth) -> Result<Vec<Value>, FetchError> {
        let query = MonthQuery {
            month: month.to_string(),
            page_num: 1,
            page_size: self.page_size,
        };

        let response = self
            .client
            .get(format!("{}/Daily539Result", self.base_url))
            .query(&query)
            .send()
            .await?
            .error_for_status()?;

        let raw = response.text().await?;
        items_from_body(&raw)
    }
}

/// Unwraps a `Daily539Result` envelope into its raw draw items. A missing
/// `content` or `daily539Res` is an empty month.
pub fn items_from_body(raw: &str) -> Result<Vec<Value>, FetchError> {
    let body: DailyCashResponse = serde_json::from_str(raw)?;
    if body.rt_code != 0 {
        return Err(FetchError::Api {
            code: body.rt_code,
            message: body.rt_msg.unwrap_or_else(|| "unknown error".to_string()),
        });
    }

    Ok(body.content.unwrap_or_default().daily539_res)
}

fn is_certificate_error(err: &(dyn Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.to_string().to_ascii_lowercase().contains("certificate") {
            return true;
        }
        current = e.source();
    }
    false
}

impl DrawSource for Fetcher {
    async fn fetch_month(&self, month: YearMonth) -> Vec<Value> {
        debug!("Requesting draws for {}", month);
        match self.request_month(month).await {
            Ok(items) => items,
            Err(e) => {
                warn!("✗ Error fetching draws for {}: {}", month, e);
                if is_certificate_error(&e) {
                    warn!("Certificate verification failed; set DAILY539_INSECURE_TLS=true to accept the endpoint's certificate chain");
                }
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// New draws were merged and the table rewritten.
    Updated { added: usize, total: usize },
    /// Nothing new; the table on disk was left alone.
    UpToDate { total: usize },
    /// No local history and nothing fetched.
    NoData,
}

/// First month to request: the month of the newest stored draw, so late
/// results from that month are still picked up.
pub fn start_month(table: &DrawTable, epoch: YearMonth) -> YearMonth {
    table.latest_date().map(YearMonth::of).unwrap_or(epoch)
}

/// Crawls every month from the start month through `today` and merges the
/// results into the table at `path`.
pub async fn update_draws<S: DrawSource>(
    path: &Path,
    source: &S,
    config: &FetchConfig,
    today: NaiveDate,
) -> Result<UpdateOutcome, StoreError> {
    let existing = DrawTable::load(path)?;
    let start = start_month(&existing, config.epoch);

    match existing.latest_date() {
        Some(latest) => info!("📊 Latest stored draw {}, crawling from {}", latest, start),
        None => info!("🆕 No stored draws, crawling from {}", start),
    }

    let months = months_through(start, YearMonth::of(today));
    let mut incoming = Vec::new();

    for (i, month) in months.iter().enumerate() {
        let items = source.fetch_month(*month).await;
        let draws = normalize_batch(&items);
        if !draws.is_empty() {
            info!("✓ {}: {} draws", month, draws.len());
        }
        incoming.extend(draws);

        if i + 1 < months.len() && !config.request_delay.is_zero() {
            tokio::time::sleep(config.request_delay).await;
        }
    }

    let merged = merge(&existing, &incoming);
    let known: HashSet<&str> = existing.draws().iter().map(|d| d.period()).collect();
    let added = merged
        .draws()
        .iter()
        .filter(|d| !known.contains(d.period()))
        .count();

    if added > 0 {
        merged.save(path)?;
        info!("🎯 Added {} draws, {} in total", added, merged.len());
        Ok(UpdateOutcome::Updated {
            added,
            total: merged.len(),
        })
    } else if !existing.is_empty() {
        info!("Draw table already up to date ({} draws)", existing.len());
        Ok(UpdateOutcome::UpToDate {
            total: existing.len(),
        })
    } else {
        warn!("⚠ No draws could be fetched");
        Ok(UpdateOutcome::NoData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeSource {
        months: HashMap<YearMonth, Vec<Value>>,
        requested: RefCell<Vec<YearMonth>>,
    }

    impl FakeSource {
        fn with(mut self, month: YearMonth, items: Vec<Value>) -> Self {
            self.months.insert(month, items);
            self
        }
    }

    impl DrawSource for FakeSource {
        async fn fetch_month(&self, month: YearMonth) -> Vec<Value> {
            self.requested.borrow_mut().push(month);
            self.months.get(&month).cloned().unwrap_or_default()
        }
    }

    fn item(date: &str, period: u64, numbers: [i64; 5]) -> Value {
        json!({
            "lotteryDate": format!("{}T00:00:00", date),
            "period": period,
            "drawNumberAppear": numbers,
        })
    }

    fn config() -> FetchConfig {
        FetchConfig {
            request_delay: Duration::ZERO,
            epoch: YearMonth::new(2024, 1),
            ..FetchConfig::default()
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_start_month() {
        let epoch = YearMonth::new(2014, 1);
        assert_eq!(start_month(&DrawTable::default(), epoch), epoch);

        let table = DrawTable::new(vec![
            crate::models::Draw::new("1", day(2024, 3, 15), &[1, 2, 3, 4, 5]).unwrap(),
        ]);
        assert_eq!(start_month(&table, epoch), YearMonth::new(2024, 3));
    }

    #[tokio::test]
    async fn test_first_update_crawls_from_epoch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lottery_data.csv");
        let source = FakeSource::default()
            .with(
                YearMonth::new(2024, 1),
                vec![
                    item("2024-01-02", 113000001, [5, 4, 3, 2, 1]),
                    json!({ "period": 113000002 }),
                ],
            )
            .with(
                YearMonth::new(2024, 3),
                vec![item("2024-03-01", 113000050, [10, 11, 20, 21, 39])],
            );

        let outcome = update_draws(&path, &source, &config(), day(2024, 3, 10))
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Updated { added: 2, total: 2 });
        assert_eq!(
            *source.requested.borrow(),
            vec![
                YearMonth::new(2024, 1),
                YearMonth::new(2024, 2),
                YearMonth::new(2024, 3)
            ]
        );
        let saved = DrawTable::load(&path).unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved.latest_date(), Some(day(2024, 3, 1)));
    }

    #[tokio::test]
    async fn test_incremental_update_starts_at_latest_month() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lottery_data.csv");
        DrawTable::new(vec![
            crate::models::Draw::new("113000050", day(2024, 3, 1), &[1, 2, 3, 4, 5]).unwrap(),
        ])
        .save(&path)
        .unwrap();

        let source = FakeSource::default().with(
            YearMonth::new(2024, 3),
            vec![
                item("2024-03-01", 113000050, [1, 2, 3, 4, 5]),
                item("2024-03-02", 113000051, [6, 7, 8, 9, 10]),
            ],
        );

        let outcome = update_draws(&path, &source, &config(), day(2024, 4, 2))
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Updated { added: 1, total: 2 });
        assert_eq!(
            *source.requested.borrow(),
            vec![YearMonth::new(2024, 3), YearMonth::new(2024, 4)]
        );
    }

    #[tokio::test]
    async fn test_up_to_date_does_not_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lottery_data.csv");
        DrawTable::new(vec![
            crate::models::Draw::new("1", day(2024, 3, 1), &[1, 2, 3, 4, 5]).unwrap(),
        ])
        .save(&path)
        .unwrap();
        let before = std::fs::read_to_string(&path).unwrap();
        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();

        let source = FakeSource::default().with(
            YearMonth::new(2024, 3),
            vec![item("2024-03-01", 1, [1, 2, 3, 4, 5])],
        );
        let outcome = update_draws(&path, &source, &config(), day(2024, 3, 5))
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::UpToDate { total: 1 });
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), modified);
    }

    #[tokio::test]
    async fn test_nothing_fetched_and_nothing_stored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lottery_data.csv");
        let outcome = update_draws(&path, &FakeSource::default(), &config(), day(2024, 2, 1))
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::NoData);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_duplicate_stored_period_does_not_hide_new_draw() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lottery_data.csv");
        std::fs::write(
            &path,
            "draw,date,ad_date,numbers,price,lottery_type\n\
             1,113/03/01,2024-03-01,\"01,02,03,04,05\",8000000,daily_cash\n\
             1,113/03/01,2024-03-01,\"01,02,03,04,05\",8000000,daily_cash\n",
        )
        .unwrap();

        let source = FakeSource::default().with(
            YearMonth::new(2024, 3),
            vec![item("2024-03-02", 2, [6, 7, 8, 9, 10])],
        );
        let outcome = update_draws(&path, &source, &config(), day(2024, 3, 5))
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Updated { added: 1, total: 2 });
        let saved = DrawTable::load(&path).unwrap();
        let periods: Vec<&str> = saved.draws().iter().map(|d| d.period()).collect();
        assert_eq!(periods, vec!["1", "2"]);
    }

    #[test]
    fn test_items_from_body() {
        let ok = r#"{"rtCode":0,"rtMsg":"","content":{"daily539Res":[{"period":1},{"period":2}]}}"#;
        assert_eq!(items_from_body(ok).unwrap().len(), 2);

        let no_content = r#"{"rtCode":0,"content":null}"#;
        assert!(items_from_body(no_content).unwrap().is_empty());

        let no_items = r#"{"rtCode":0,"content":{"totalSize":0}}"#;
        assert!(items_from_body(no_items).unwrap().is_empty());
    }

    #[test]
    fn test_items_from_body_errors() {
        let rejected = r#"{"rtCode":1,"rtMsg":"查詢失敗","content":null}"#;
        match items_from_body(rejected) {
            Err(FetchError::Api { code, message }) => {
                assert_eq!(code, 1);
                assert_eq!(message, "查詢失敗");
            }
            other => panic!("expected API error, got {:?}", other),
        }

        assert!(matches!(
            items_from_body(r#"{"content":{"daily539Res":[]}}"#),
            Err(FetchError::Decode(_))
        ));
        assert!(matches!(
            items_from_body("<html>maintenance</html>"),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn test_certificate_errors_are_recognised_through_the_source_chain() {
        let tls = StoreError::Io {
            path: "lottery_data.csv".into(),
            source: std::io::Error::other("invalid peer certificate: UnknownIssuer"),
        };
        assert!(is_certificate_error(&tls));

        let api = FetchError::Api {
            code: 1,
            message: "busy".to_string(),
        };
        assert!(!is_certificate_error(&api));
    }
}
