use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod mcp_handler;
mod use_cases;

use mcp_handler::{MCPHandler, stdio};
use use_cases::{StatsUseCase, UpdateUseCase};

#[tokio::main]
async fn main() -> Result<()> {
    let config = daily539::config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Serving Daily Cash 539 draws from {}", config.data_path.display());

    let stats_use_case = StatsUseCase::new(config.data_path.clone());
    let update_use_case = UpdateUseCase::new(config.data_path, config.fetch);

    let handler = MCPHandler::new(Arc::new(stats_use_case), Arc::new(update_use_case));

    let (reader, writer) = stdio();

    handler.serve(reader, writer).await.inspect_err(|e| {
        tracing::error!("serving error: {:?}", e);
    })?;

    Ok(())
}
