//! Telegram bot command handlers.

use crate::format::{build_report, clamp_top_n};
use crate::store::{StateStore, StoreError};
use stablewatch_core::AlertConfig;
use stablewatch_providers::Aggregator;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
    #[error("State store error: {0}")]
    Store(#[from] StoreError),
}

/// Bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Register this chat and show usage")]
    Start,
    #[command(description = "Top rates. Usage: /rates or /rates 10")]
    Rates(String),
    #[command(description = "Threshold alert. Usage: /alert set 12, /alert off, /alert")]
    Alert(String),
    #[command(description = "List enabled rate providers")]
    Sources,
    #[command(description = "Show help")]
    Help,
}

/// Telegram bot serving on-demand rate reports and alert configuration.
pub struct RatesBot {
    bot: Bot,
    aggregator: Aggregator,
    store: StateStore,
    enabled_providers: Vec<String>,
    default_top_n: usize,
    check_minutes: u64,
}

impl RatesBot {
    pub fn new(
        bot: Bot,
        aggregator: Aggregator,
        store: StateStore,
        enabled_providers: Vec<String>,
        default_top_n: usize,
        check_minutes: u64,
    ) -> Self {
        Self {
            bot,
            aggregator,
            store,
            enabled_providers,
            default_top_n,
            check_minutes,
        }
    }

    /// Get the underlying bot for sending messages.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Run the bot command dispatcher until shutdown.
    pub async fn run(self: Arc<Self>) {
        let bot = self.bot.clone();
        let handler = Update::filter_message().filter_command::<Command>().endpoint(
            move |bot: Bot, msg: Message, cmd: Command| {
                let this = Arc::clone(&self);
                async move { this.handle_command(bot, msg, cmd).await }
            },
        );

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    async fn handle_command(
        &self,
        bot: Bot,
        msg: Message,
        cmd: Command,
    ) -> Result<(), TelegramError> {
        self.track_recipient(msg.chat.id.0);

        match cmd {
            Command::Start => {
                let text = format!(
                    "Hi! I track the best live <b>USDC</b> rates.\n\n\
                     Commands:\n\
                     • /rates [N] — top N rates (default {})\n\
                     • /alert set &lt;threshold&gt; — notify when APY ≥ threshold, e.g. <code>/alert set 12</code>\n\
                     • /alert off — disable alerts\n\
                     • /sources — data providers\n",
                    self.default_top_n
                );
                bot.send_message(msg.chat.id, text)
                    .parse_mode(ParseMode::Html)
                    .await?;
            }

            Command::Rates(arg) => {
                let top_n = match arg.trim().parse::<usize>() {
                    Ok(n) => clamp_top_n(n),
                    Err(_) => self.default_top_n,
                };
                bot.send_message(msg.chat.id, "Collecting rates…").await?;

                let items = self.aggregator.fetch_all(&self.enabled_providers).await;
                if items.is_empty() {
                    bot.send_message(msg.chat.id, "No data available right now. Try again later.")
                        .await?;
                    return Ok(());
                }
                for chunk in build_report(&items, top_n) {
                    bot.send_message(msg.chat.id, chunk)
                        .parse_mode(ParseMode::Html)
                        .await?;
                }
            }

            Command::Alert(arg) => {
                self.handle_alert(&bot, &msg, arg.trim()).await?;
            }

            Command::Sources => {
                let enabled = if self.enabled_providers.is_empty() {
                    "—".to_string()
                } else {
                    self.enabled_providers.join(", ")
                };
                bot.send_message(
                    msg.chat.id,
                    format!(
                        "Enabled providers: <b>{enabled}</b>\n\
                         Primary: DefiLlama (DeFi yields). CEX adapters register by key."
                    ),
                )
                .parse_mode(ParseMode::Html)
                .await?;
            }

            Command::Help => {
                bot.send_message(msg.chat.id, Command::descriptions().to_string())
                    .await?;
            }
        }

        Ok(())
    }

    async fn handle_alert(
        &self,
        bot: &Bot,
        msg: &Message,
        arg: &str,
    ) -> Result<(), TelegramError> {
        let mut state = self.store.load();

        if arg.is_empty() {
            let text = match &state.alert {
                Some(alert) if alert.enabled => {
                    format!("Alert is on: APY ≥ {}%", alert.threshold)
                }
                _ => "Alerts are off. Enable with /alert set 12".to_string(),
            };
            bot.send_message(msg.chat.id, text).await?;
            return Ok(());
        }

        let mut parts = arg.split_whitespace();
        match parts.next() {
            Some(sub) if sub.eq_ignore_ascii_case("off") => {
                state.alert = None;
                self.store.save(&state)?;
                info!(chat_id = msg.chat.id.0, "Alert disabled");
                bot.send_message(msg.chat.id, "Alerts disabled.").await?;
            }
            Some(sub) if sub.eq_ignore_ascii_case("set") => {
                let Some(threshold) = parts.next().and_then(|t| t.parse::<f64>().ok()) else {
                    bot.send_message(
                        msg.chat.id,
                        "Usage: /alert set <threshold>, e.g. /alert set 10.5",
                    )
                    .await?;
                    return Ok(());
                };
                state.alert = Some(AlertConfig::new(threshold));
                self.store.save(&state)?;
                info!(chat_id = msg.chat.id.0, threshold, "Alert armed");
                bot.send_message(
                    msg.chat.id,
                    format!(
                        "Done! Alerting when APY ≥ {threshold}%. Checking every {} min.",
                        self.check_minutes
                    ),
                )
                .await?;
            }
            _ => {
                bot.send_message(msg.chat.id, "Commands: /alert set <threshold> | /alert off")
                    .await?;
            }
        }
        Ok(())
    }

    // Remember every chat that talks to us so alerts can fan out to it,
    // surviving restarts via the state file.
    fn track_recipient(&self, chat_id: i64) {
        let mut state = self.store.load();
        if state.recipients.insert(chat_id) {
            if let Err(e) = self.store.save(&state) {
                warn!(chat_id, error = %e, "Failed to persist recipient");
            }
        }
    }
}
