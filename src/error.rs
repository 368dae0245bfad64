use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DrawError {
    #[error("number {0} is outside 1-39")]
    OutOfRange(i64),

    #[error("number {0} appears more than once")]
    Duplicate(u8),

    #[error("expected at least 5 numbers, got {0}")]
    TooFewNumbers(usize),

    #[error("period is empty")]
    EmptyPeriod,
}

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("missing or malformed field: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("invalid lottery date '{0}'")]
    Date(String),

    #[error("unsupported period value: {0}")]
    Period(String),

    #[error(transparent)]
    Draw(#[from] DrawError),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("row {row} of {path}: {message}")]
    Row {
        path: PathBuf,
        row: usize,
        message: String,
    },
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("AI service is not configured: set GOOGLE_API_KEY")]
    Unconfigured,

    #[error("chat session has not been started")]
    NotStarted,

    #[error("AI request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("AI service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("AI service returned no text")]
    EmptyReply,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}
