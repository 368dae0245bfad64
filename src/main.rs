mod display;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use daily539::config::{self, Config};
use daily539::prompt::{AnalysisDigest, DEFAULT_WINDOW};
use daily539::{ChatSession, Fetcher, GeminiBackend, ServiceError, StatsEngine, update_draws};

use crate::display::{display_draws, display_report, display_update_outcome};

#[derive(Parser)]
#[command(name = "daily539", about = "Daily Cash 539 draw history, statistics and AI analysis")]
struct Cli {
    /// Draw table (CSV); overrides DAILY539_DATA_PATH
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch new draws and merge them into the table
    Update,

    /// Print the statistics report
    Stats {
        /// Only use the most recent N draws
        #[arg(short, long)]
        window: Option<usize>,
    },

    /// List the most recent draws
    Latest {
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
    },

    /// Print the analysis prompt sent to the AI service
    Prompt {
        #[arg(short, long, default_value_t = DEFAULT_WINDOW)]
        window: usize,
    },

    /// Ask the AI service for an analysis, then chat about it
    Analyze {
        #[arg(short, long, default_value_t = DEFAULT_WINDOW)]
        window: usize,

        /// Update the draw table first
        #[arg(long)]
        update: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let mut config = config::load().context("invalid configuration")?;
    if let Some(data) = cli.data {
        config.data_path = data;
    }

    match cli.command {
        Command::Update => cmd_update(&config).await,
        Command::Stats { window } => cmd_stats(&config, window),
        Command::Latest { count } => cmd_latest(&config, count),
        Command::Prompt { window } => cmd_prompt(&config, window),
        Command::Analyze { window, update } => cmd_analyze(&config, window, update).await,
    }
}

async fn cmd_update(config: &Config) -> Result<()> {
    let fetcher = Fetcher::new(&config.fetch).context("failed to build HTTP client")?;
    let today = Local::now().date_naive();
    let outcome = update_draws(&config.data_path, &fetcher, &config.fetch, today).await?;
    display_update_outcome(&outcome);
    println!("✅ Draw table: {}", config.data_path.display());
    Ok(())
}

/// Loads the engine, telling the user when there is nothing to analyse yet.
fn load_engine(config: &Config) -> Result<Option<StatsEngine>> {
    let engine = StatsEngine::load(&config.data_path)?;
    if engine.is_empty() {
        println!(
            "⚠️ No draw data at {}. Run `daily539 update` first.",
            config.data_path.display()
        );
        return Ok(None);
    }
    Ok(Some(engine))
}

fn cmd_stats(config: &Config, window: Option<usize>) -> Result<()> {
    if let Some(engine) = load_engine(config)? {
        display_report(&engine, window);
    }
    Ok(())
}

fn cmd_latest(config: &Config, count: usize) -> Result<()> {
    if let Some(engine) = load_engine(config)? {
        display_draws(engine.latest_n_draws(count));
    }
    Ok(())
}

fn cmd_prompt(config: &Config, window: usize) -> Result<()> {
    if let Some(engine) = load_engine(config)? {
        match AnalysisDigest::build(&engine, window) {
            Some(digest) => println!("{}", digest.render_prompt()),
            None => println!("⚠️ Window of {} draws holds no data.", window),
        }
    }
    Ok(())
}

async fn cmd_analyze(config: &Config, window: usize, update: bool) -> Result<()> {
    if update {
        cmd_update(config).await?;
    }

    let backend = match GeminiBackend::from_config(&config.ai) {
        Ok(backend) => backend,
        Err(ServiceError::Unconfigured) => {
            println!("⚠️ AI analysis is disabled: set GOOGLE_API_KEY to enable it.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let Some(engine) = load_engine(config)? else {
        return Ok(());
    };
    let Some(digest) = AnalysisDigest::build(&engine, window) else {
        println!("⚠️ Window of {} draws holds no data.", window);
        return Ok(());
    };

    let mut session = ChatSession::new(backend);
    println!("🤖 Asking the AI service for an analysis of the last {} draws...", window);
    match session.start(&digest.render_prompt()).await {
        Ok(reply) => println!("\n{}\n", reply),
        Err(e) => {
            println!("❌ AI analysis failed: {}", e);
            return Ok(());
        }
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Your question ('exit' to quit): ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let question = line?;
        let question = question.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") {
            break;
        }

        match session.send(question).await {
            Ok(reply) => println!("AI: {}\n", reply),
            Err(e) => println!("❌ {}\n", e),
        }
    }

    Ok(())
}
