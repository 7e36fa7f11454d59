//! Periodic threshold alert engine.
//!
//! The engine is idle or armed depending solely on the persisted
//! [`AlertConfig`]; only explicit commands move it between the two. Each
//! tick reloads state from disk so configuration edits take effect
//! without a restart.

use crate::format::format_row;
use crate::store::StateStore;
use stablewatch_core::{AlertConfig, RateItem};
use stablewatch_providers::Aggregator;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};
use tracing::{debug, error, info};

/// Long-running alert check loop.
pub struct AlertEngine {
    bot: Bot,
    aggregator: Aggregator,
    store: StateStore,
    enabled_providers: Vec<String>,
    interval: Duration,
}

impl AlertEngine {
    pub fn new(
        bot: Bot,
        aggregator: Aggregator,
        store: StateStore,
        enabled_providers: Vec<String>,
        interval: Duration,
    ) -> Self {
        Self {
            bot,
            aggregator,
            store,
            enabled_providers,
            interval,
        }
    }

    /// Run for the lifetime of the process. A failed cycle is logged and
    /// retried on the next interval, never fatal.
    pub async fn run(self) {
        info!(interval_secs = self.interval.as_secs(), "Starting alert engine");
        loop {
            tokio::time::sleep(self.interval).await;
            if let Err(e) = self.run_cycle().await {
                error!(error = %e, "Alert cycle failed");
            }
        }
    }

    async fn run_cycle(&self) -> Result<(), crate::telegram::TelegramError> {
        let state = self.store.load();
        let Some(alert) = state.alert.filter(|a| a.enabled) else {
            debug!("Alert idle, skipping cycle");
            return Ok(());
        };

        let items = self.aggregator.fetch_all(&self.enabled_providers).await;
        if !should_trigger(items.first(), &alert) {
            debug!(
                best_apy = items.first().map(|b| b.apy),
                threshold = alert.threshold,
                "Below threshold, no alert"
            );
            return Ok(());
        }
        let Some(best) = items.first() else {
            return Ok(());
        };

        let message = format!(
            "🚨 USDC rate at or above {}%\n\n{}",
            alert.threshold,
            format_row(1, best)
        );

        for &chat_id in &state.recipients {
            match self
                .bot
                .send_message(ChatId(chat_id), message.clone())
                .parse_mode(ParseMode::Html)
                .await
            {
                Ok(_) => info!(chat_id, apy = best.apy, "Alert sent"),
                Err(e) => error!(chat_id, error = %e, "Failed to send alert"),
            }
        }
        Ok(())
    }
}

/// Inclusive threshold comparison: the best offer triggers at exactly
/// the configured APY.
pub fn should_trigger(best: Option<&RateItem>, alert: &AlertConfig) -> bool {
    alert.enabled && best.is_some_and(|b| b.apy >= alert.threshold)
}
