use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::utils::YearMonth;

pub const DEFAULT_DATA_PATH: &str = "lottery_data/lottery_data.csv";
pub const DEFAULT_API_BASE_URL: &str = "https://api.taiwanlottery.com/TLCAPIWeB/Lottery";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const PAGE_SIZE: u32 = 50;

/// First month crawled when there is no local history yet.
pub const EPOCH_MONTH: YearMonth = YearMonth {
    year: 2014,
    month: 1,
};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub request_delay: Duration,
    pub page_size: u32,
    pub accept_invalid_certs: bool,
    pub epoch: YearMonth,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            request_delay: Duration::from_millis(1000),
            page_size: PAGE_SIZE,
            accept_invalid_certs: false,
            epoch: EPOCH_MONTH,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    pub fetch: FetchConfig,
    pub ai: AiConfig,
}

pub fn load() -> Result<Config, ConfigError> {
    from_lookup(|name| env::var(name).ok())
}

/// Builds the config from any variable source; `load` uses the process environment.
pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = FetchConfig::default();

    let data_path = lookup("DAILY539_DATA_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

    let timeout = match lookup("DAILY539_TIMEOUT_SECS") {
        Some(v) => Duration::from_secs(parse_u64("DAILY539_TIMEOUT_SECS", &v)?),
        None => defaults.timeout,
    };

    let request_delay = match lookup("DAILY539_REQUEST_DELAY_MS") {
        Some(v) => Duration::from_millis(parse_u64("DAILY539_REQUEST_DELAY_MS", &v)?),
        None => defaults.request_delay,
    };

    let accept_invalid_certs = match lookup("DAILY539_INSECURE_TLS") {
        Some(v) => parse_bool("DAILY539_INSECURE_TLS", &v)?,
        None => defaults.accept_invalid_certs,
    };

    let fetch = FetchConfig {
        base_url: lookup("DAILY539_API_BASE_URL").unwrap_or(defaults.base_url),
        timeout,
        request_delay,
        accept_invalid_certs,
        ..defaults
    };

    let ai = AiConfig {
        api_key: lookup("GOOGLE_API_KEY").filter(|k| !k.trim().is_empty()),
        base_url: lookup("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
        model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
    };

    Ok(Config {
        data_path,
        fetch,
        ai,
    })
}

fn parse_u64(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        expected: "a non-negative integer",
        value: value.to_string(),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            expected: "true or false",
            value: value.to_string(),
        }),
    }
}
