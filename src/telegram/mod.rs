//! Telegram Bot API adapter

pub mod client;
pub mod types;

// Re-export for convenience
pub use client::TelegramClient;
pub use types::{Event, Update};
