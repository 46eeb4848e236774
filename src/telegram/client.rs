use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use log::{debug, trace, error};

use super::types::{
  ApiResponse, GetUpdatesRequest, SendChatActionRequest
, SendMessageRequest, Update, User
};

/// Telegram caps a single text message at this many characters
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// TCP connect bound for Bot API calls
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Bound on a call on top of any long-poll wait it asks for
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin Bot API client.
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct TelegramClient
{   http_client: reqwest::Client
  , method_base: String
  , request_timeout: Duration
}

// Keeps the bot token out of debug output
impl std::fmt::Debug for TelegramClient
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   f.debug_struct("TelegramClient").finish_non_exhaustive()
    }
}

impl TelegramClient
{   pub fn new(
      api_url: &str
    , bot_token: &str
    ) -> Result<Self, crate::error::Error>
    {   debug!("Creating TelegramClient");
        let http_client = reqwest::Client::builder()
          .connect_timeout(CONNECT_TIMEOUT)
          .build()
          .map_err(|e| {
            crate::error::Error::InvalidConfiguration(format!(
              "failed to build Telegram HTTP client: {}", e
            ))
          })?;

        Ok(TelegramClient
        {   http_client
          , method_base: format!(
              "{}/bot{}",
              api_url.trim_end_matches('/'),
              bot_token
            )
          , request_timeout: REQUEST_TIMEOUT
        })
    }

    pub fn from_config(
      config: &crate::config::RelayConfig
    ) -> Result<Self, crate::error::Error>
    {   Self::new(&config.telegram_api_url, &config.bot_token)
    }

    /// Replace the per-call bound added on top of long-poll waits
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self
    {   self.request_timeout = request_timeout;
        self
    }

    /// Verify the token and fetch the bot identity
    pub async fn get_me(&self)
      -> Result<User, crate::error::Error>
    {   self.call("getMe", &serde_json::json!({}), 0).await
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(
      &self
    , offset: Option<i64>
    , timeout_secs: u64
    ) -> Result<Vec<Update>, crate::error::Error>
    {   let request = GetUpdatesRequest
        {   offset
          , timeout: timeout_secs
          , allowed_updates: vec!["message".to_string()]
        };
        self.call("getUpdates", &request, timeout_secs).await
    }

    /// Send text to a chat, split into several messages if too long
    pub async fn send_message(
      &self
    , chat_id: i64
    , text: &str
    ) -> Result<(), crate::error::Error>
    {   for chunk in split_message(text, MAX_MESSAGE_CHARS)
        {   let request = SendMessageRequest
            {   chat_id
              , text: chunk
            };
            let _: serde_json::Value
              = self.call("sendMessage", &request, 0).await?;
        }
        Ok(())
    }

    /// Show the "typing" indicator in a chat
    pub async fn send_typing(
      &self
    , chat_id: i64
    ) -> Result<(), crate::error::Error>
    {   let request = SendChatActionRequest
        {   chat_id
          , action: "typing".to_string()
        };
        let _: bool = self.call("sendChatAction", &request, 0).await?;
        Ok(())
    }

    /// One Bot API call. A peer that accepts and then goes silent
    /// surfaces as an error once `wait_secs` plus the request bound pass.
    async fn call<Req, Res>(
      &self
    , method: &str
    , request: &Req
    , wait_secs: u64
    ) -> Result<Res, crate::error::Error>
    where
      Req: Serialize
    , Res: DeserializeOwned
    {   trace!("Telegram call: {}", method);

        let response = self.http_client
          .post(format!("{}/{}", self.method_base, method))
          .timeout(Duration::from_secs(wait_secs) + self.request_timeout)
          .json(request)
          .send()
          .await
          .map_err(|e| {
            // reqwest errors embed the URL, which holds the token
            let e = e.without_url();
            error!("Telegram {} HTTP error: {}", method, e);
            crate::error::Error::Telegram(e.to_string())
          })?;

        let status = response.status();
        let raw = response.text().await.map_err(|e| {
          crate::error::Error::Telegram(e.without_url().to_string())
        })?;
        trace!("Telegram {} status: {}", method, status);

        let envelope: ApiResponse<Res> = serde_json::from_str(&raw)
          .map_err(|e| {
            error!("Telegram {} unparseable reply: {}", method, e);
            crate::error::Error::Telegram(
              format!("HTTP {}: {}", status.as_u16(), raw)
            )
          })?;

        if !envelope.ok
        {   let description = envelope.description
              .unwrap_or_else(|| "Unknown error".to_string());
            error!("Telegram {} refused: {}", method, description);
            return Err(crate::error::Error::Telegram(format!(
              "{}: {}",
              envelope.error_code.unwrap_or(status.as_u16() as i64),
              description
            )));
        }

        envelope.result.ok_or_else(|| {
          crate::error::Error::Telegram(
            format!("{} returned no result", method)
          )
        })
    }
}

/// Split on character boundaries into pieces of at most `max` chars.
/// Empty text stays a single empty piece so the API reports it.
pub fn split_message(text: &str, max: usize) -> Vec<String>
{   if text.chars().count() <= max
    {   return vec![text.to_string()];
    }

    let chars: Vec<char> = text.chars().collect();
    chars
      .chunks(max)
      .map(|c| c.iter().collect())
      .collect()
}
