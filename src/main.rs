//! paraphrase-worker binary: runs the Telegram bot and the REST API over one worker.

use clap::Parser;
use paraphrase_worker::telegram::TelegramBot;
use paraphrase_worker::{Config, ParaphraseWorker, api, wait_for_signal};
use std::path::PathBuf;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "paraphrase-worker", version, about)]
struct Args {
    /// JSON configuration file (defaults plus environment when omitted)
    #[arg(short, long, env = "PARAPHRASE_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Do not start the Telegram bot even if a token is configured
    #[arg(long)]
    no_telegram: bool,

    /// Do not serve the REST API
    #[arg(long)]
    no_api: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;

    let worker = ParaphraseWorker::new(config).await?;
    let cancel = CancellationToken::new();
    let mut tasks = JoinSet::new();

    if worker.config().api.enabled && !args.no_api {
        let worker = worker.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            if let Err(e) = api::start_api_server(worker, cancel).await {
                tracing::error!(error = %e, "API server failed");
            }
        });
    }

    if worker.config().telegram.bot_token.is_some() && !args.no_telegram {
        let bot = TelegramBot::new(worker.clone())?;
        tasks.spawn(bot.run(cancel.clone()));
    } else {
        tracing::info!("Telegram bot disabled");
    }

    if tasks.is_empty() {
        tracing::warn!("neither the API nor the bot is enabled, nothing to do");
        return Ok(());
    }

    wait_for_signal().await;

    cancel.cancel();
    while tasks.join_next().await.is_some() {}
    worker.shutdown().await?;

    Ok(())
}
