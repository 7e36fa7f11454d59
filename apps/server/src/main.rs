//! Stablewatch - Stablecoin Yield Bot
//!
//! A Telegram bot that aggregates USDC yield offers from external
//! providers and reports them on demand or via periodic threshold
//! alerts.

mod config;

use clap::Parser;
use config::AppConfig;
use stablewatch_alerts::{AlertEngine, RatesBot, StateStore};
use stablewatch_providers::{Aggregator, ProviderRegistry};
use std::sync::Arc;
use std::time::Duration;
use teloxide::Bot;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Stablewatch Bot CLI
#[derive(Parser, Debug)]
#[command(name = "stablewatch-bot")]
#[command(about = "Stablecoin yield rates Telegram bot", long_about = None)]
struct Args {
    /// Persisted state file path
    #[arg(short, long, default_value = "state.json")]
    state_file: String,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    info!(
        providers = ?config.enabled_providers,
        check_minutes = config.alert_check_minutes,
        state_file = %args.state_file,
        "Starting stablewatch"
    );

    let registry = ProviderRegistry::standard(config.binance_credentials.clone());
    let aggregator = Aggregator::new(registry);
    let store = StateStore::new(&args.state_file);
    let bot = Bot::new(&config.telegram_bot_token);

    let engine = AlertEngine::new(
        bot.clone(),
        aggregator.clone(),
        store.clone(),
        config.enabled_providers.clone(),
        Duration::from_secs(config.alert_check_minutes * 60),
    );
    tokio::spawn(engine.run());

    let rates_bot = Arc::new(RatesBot::new(
        bot,
        aggregator,
        store,
        config.enabled_providers,
        config.default_top_n,
        config.alert_check_minutes,
    ));

    info!("Bot is running");
    rates_bot.run().await;
}
