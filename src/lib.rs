pub mod ai;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod prompt;
pub mod stats;
pub mod store;
pub mod types;
pub mod utils;

pub use ai::{ChatBackend, ChatSession, GeminiBackend};
pub use api::{DrawSource, Fetcher, UpdateOutcome, update_draws};
pub use config::Config;
pub use error::{ConfigError, DrawError, FetchError, NormalizeError, ServiceError, StoreError};
pub use models::Draw;
pub use prompt::AnalysisDigest;
pub use stats::StatsEngine;
pub use store::{DrawTable, merge};
