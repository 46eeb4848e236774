use std::fmt;

/// Custom error type for relay operations
/// Implements Clone so handlers can log and reply with the same value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Bot token missing from the environment
    MissingBotToken
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Inference endpoint unreachable at the transport level
    Connect(String)
  , /// Inference call exceeded its wall-clock bound (seconds)
    Timeout(u64)
  , /// Inference endpoint answered with a non-success status
    Status
    {   status: u16
      , body: String
    }
  , /// Inference response body is not JSON
    NonJson(String)
  , /// Inference response JSON lacks a string `text` field
    MissingText(String)
  , /// Any other HTTP failure, original message kept
    Http(String)
  , /// Telegram Bot API refused or failed a call
    Telegram(String)
  , /// Generic error
    Other(String)
}

impl Error
{   /// Whether the error came out of the inference call itself
    pub fn is_inference(&self) -> bool
    {   matches!(
          self
        , Error::Connect(_)
          | Error::Timeout(_)
          | Error::Status { .. }
          | Error::NonJson(_)
          | Error::MissingText(_)
          | Error::Http(_)
        )
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::MissingBotToken => {
              write!(f, "TELEGRAM_BOT_TOKEN is missing")
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Connect(_) => {
              write!(f,
                "Cannot connect to the AI API. \
                 Check that the server is reachable."
              )
            }
          , Error::Timeout(secs) => {
              write!(f, "AI API connection timeout ({} sec)", secs)
            }
          , Error::Status { status, body } => {
              write!(f, "AI API error {}: {}", status, body)
            }
          , Error::NonJson(body) => {
              write!(f, "AI API returned non-JSON: {}", body)
            }
          , Error::MissingText(body) => {
              write!(f, "AI API JSON has no \"text\": {}", body)
            }
          , Error::Http(msg) => {
              write!(f, "{}", msg)
            }
          , Error::Telegram(msg) => {
              write!(f, "Telegram error: {}", msg)
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}
