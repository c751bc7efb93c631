mod checker;
mod config;
mod email;
mod notify;
mod retention;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use checker::Checker;
use config::AppConfig;
use email::gmail::GmailStore;
use email::provider::DraftStore;
use notify::{DesktopNotifier, Notifier};

const APP_NAME: &str = "CalmDrafts";

#[derive(Parser, Debug)]
#[clap(
    name = "calmdrafts",
    version,
    about = "Watches your Gmail drafts folder and cleans up old empty drafts"
)]
struct Cli {
    /// Path to the JSON configuration file
    #[clap(long, default_value = "config.json")]
    config: PathBuf,

    /// Run a single check and exit
    #[clap(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load(&cli.config)?;
    tracing::info!("{} starting", APP_NAME);
    tracing::info!(
        "Account: {} ({}:{}, folder {})",
        config.email.address,
        config.email.imap_host,
        config.email.imap_port,
        config.email.drafts_folder
    );
    tracing::info!(
        "Check interval: {}s, cleanup age: {}h",
        config.check_interval_secs,
        config.cleanup_age_hours
    );

    let store: Arc<dyn DraftStore> = Arc::new(GmailStore::new(config.email.clone()));
    let notifier: Arc<dyn Notifier> = Arc::new(DesktopNotifier::new(APP_NAME));

    let checker = Checker::new(store, notifier, APP_NAME, config.cleanup_age());

    if cli.check {
        // Single-shot mode: one cycle, non-zero exit on failure
        checker.run_check().await?;
        return Ok(());
    }

    checker.run_loop(config.check_interval()).await
}
