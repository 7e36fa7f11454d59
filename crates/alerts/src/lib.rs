//! Telegram alert surface for the stablecoin yield bot.
//!
//! This crate provides:
//! - JSON file-based state storage
//! - Report formatting with Telegram message-size chunking
//! - Telegram bot commands for on-demand reports and alert configuration
//! - The periodic alert engine

pub mod engine;
pub mod format;
pub mod store;
pub mod telegram;

pub use engine::AlertEngine;
pub use format::{build_report, format_row, MAX_CHUNK_CHARS};
pub use store::{StateStore, StoreError};
pub use telegram::{Command, RatesBot, TelegramError};
