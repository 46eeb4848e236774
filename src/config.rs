//! Configuration for the relay, read once from the environment

use std::time::Duration;
use log::{debug, warn};

/// Default inference endpoint
pub const DEFAULT_AI_URL: &str
  = "https://spiralai.duckdns.org/api/v1/ai/chat";

/// Default Telegram Bot API server
pub const DEFAULT_TELEGRAM_API_URL: &str
  = "https://api.telegram.org";

/// Hard bound on one inference call
pub const AI_TIMEOUT_SECS: u64 = 30;

/// Long-poll wait passed to getUpdates
pub const POLL_TIMEOUT_SECS: u64 = 30;

/// Relay configuration
#[derive(Debug, Clone)]
pub struct RelayConfig
{   /// Telegram bot token (required)
    pub bot_token: String
  , /// Shared secret sent as X-Internal-Token
    pub internal_token: Option<String>
  , /// Inference endpoint URL
    pub ai_url: String
  , /// Wall-clock bound on one inference call
    pub ai_timeout: Duration
  , /// Telegram Bot API base URL
    pub telegram_api_url: String
  , /// Long-poll timeout for getUpdates in seconds
    pub poll_timeout_secs: u64
}

impl Default for RelayConfig
{   fn default() -> Self
    {   RelayConfig
        {   bot_token: String::new()
          , internal_token: None
          , ai_url: DEFAULT_AI_URL.to_string()
          , ai_timeout: Duration::from_secs(AI_TIMEOUT_SECS)
          , telegram_api_url: DEFAULT_TELEGRAM_API_URL.to_string()
          , poll_timeout_secs: POLL_TIMEOUT_SECS
        }
    }
}

impl RelayConfig
{   /// Load from process environment variables
    pub fn from_env() -> Result<Self, crate::error::Error>
    {   Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup.
    /// Empty values count as absent.
    pub fn from_lookup<F>(lookup: F)
      -> Result<Self, crate::error::Error>
    where
      F: Fn(&str) -> Option<String>
    {   let get = |key: &str| {
          lookup(key).filter(|v| !v.trim().is_empty())
        };

        let bot_token = get("TELEGRAM_BOT_TOKEN")
          .ok_or(crate::error::Error::MissingBotToken)?;

        let internal_token = get("INTERNAL_TOKEN");
        if internal_token.is_none()
        {   warn!(
              "INTERNAL_TOKEN is missing (X-Internal-Token), \
               requests will carry an empty token"
            );
        }

        let defaults = RelayConfig::default();
        let config = RelayConfig
        {   bot_token
          , internal_token
          , ai_url: get("AI_URL").unwrap_or(defaults.ai_url)
          , telegram_api_url: get("TELEGRAM_API_URL")
              .map(|u| u.trim_end_matches('/').to_string())
              .unwrap_or(defaults.telegram_api_url)
          , ..defaults
        };

        debug!(
          "Loaded config: ai_url={} telegram_api_url={}",
          config.ai_url, config.telegram_api_url
        );
        Ok(config)
    }
}
