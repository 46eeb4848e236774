//! Relay call to the remote inference endpoint

use std::time::Duration;
use log::{debug, trace, error, warn};

use crate::request::{InferenceResult, PromptRequest};

/// Header carrying the shared secret
pub const INTERNAL_TOKEN_HEADER: &str = "X-Internal-Token";

/// TCP connect bound; a host that never answers becomes `Error::Connect`
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the inference endpoint.
///
/// Every `send_prompt` owns its own request future and its own deadline,
/// so concurrent calls never share a timer.
#[derive(Debug, Clone)]
pub struct InferenceClient
{   http_client: reqwest::Client
  , url: String
  , internal_token: String
  , timeout: Duration
}

impl InferenceClient
{   /// Create a client; an absent token is sent as an empty header value
    pub fn new(
      url: String
    , internal_token: Option<String>
    , timeout: Duration
    ) -> Result<Self, crate::error::Error>
    {   Self::with_timeouts(url, internal_token, timeout, CONNECT_TIMEOUT)
    }

    /// Like `new`, with an explicit TCP connect bound
    pub fn with_timeouts(
      url: String
    , internal_token: Option<String>
    , timeout: Duration
    , connect_timeout: Duration
    ) -> Result<Self, crate::error::Error>
    {   debug!("Creating InferenceClient for {}", url);
        let http_client = reqwest::Client::builder()
          .connect_timeout(connect_timeout)
          .build()
          .map_err(|e| {
            crate::error::Error::InvalidConfiguration(format!(
              "failed to build inference HTTP client: {}", e
            ))
          })?;

        Ok(InferenceClient
        {   http_client
          , url
          , internal_token: internal_token.unwrap_or_default()
          , timeout
        })
    }

    pub fn from_config(
      config: &crate::config::RelayConfig
    ) -> Result<Self, crate::error::Error>
    {   Self::new(
          config.ai_url.clone()
        , config.internal_token.clone()
        , config.ai_timeout
        )
    }

    pub fn url(&self) -> &str
    {   &self.url
    }

    /// Send one prompt and normalize the outcome.
    /// The deadline covers the whole exchange; on expiry the in-flight
    /// request is dropped and `Error::Timeout` returned.
    pub async fn send_prompt(
      &self
    , prompt: &str
    ) -> Result<InferenceResult, crate::error::Error>
    {   debug!("send_prompt ({} chars)", prompt.chars().count());

        match tokio::time::timeout(self.timeout, self.post_prompt(prompt))
          .await
        {   Ok(result) => result
          , Err(_) => {
              warn!(
                "Inference call exceeded {:?}, request aborted",
                self.timeout
              );
              Err(crate::error::Error::Timeout(self.timeout.as_secs()))
            }
        }
    }

    async fn post_prompt(
      &self
    , prompt: &str
    ) -> Result<InferenceResult, crate::error::Error>
    {   let request = PromptRequest
        {   prompt: prompt.to_string()
        };

        trace!("Inference request: {:?}", request);

        let response = self.http_client
          .post(&self.url)
          .header("Content-Type", "application/json")
          .header(INTERNAL_TOKEN_HEADER, &self.internal_token)
          .json(&request)
          .send()
          .await
          .map_err(|e| self.classify(e))?;

        let status = response.status();
        trace!("Inference response status: {}", status);

        let raw = response.text().await
          .map_err(|e| self.classify(e))?;

        crate::request::parse_response(status.as_u16(), raw)
          .map_err(|e| {
            error!("Inference call failed: {}", e);
            e
          })
    }

    fn classify(&self, e: reqwest::Error) -> crate::error::Error
    {   error!("HTTP error: {}", e);
        if e.is_connect()
        {   crate::error::Error::Connect(e.to_string())
        } else if e.is_timeout()
        {   crate::error::Error::Timeout(self.timeout.as_secs())
        } else
        {   crate::error::Error::Http(e.to_string())
        }
    }
}
