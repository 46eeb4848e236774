//! Request and response bodies for the inference endpoint

use serde::{Deserialize, Serialize};

/// Body posted to the inference endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRequest
{   /// The prompt text, sent exactly as given
    pub prompt: String
}

/// Successful inference outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult
{   /// Generated text
    pub text: String
  , /// Opaque usage metadata, passed through unmodified
    pub usage: Option<serde_json::Value>
}

/// Classify a finished response by status and raw body
pub fn parse_response(
  status: u16
, raw: String
) -> Result<InferenceResult, crate::error::Error>
{   if !(200..300).contains(&status)
    {   return Err(crate::error::Error::Status
        {   status
          , body: raw
        });
    }

    let data: serde_json::Value = match serde_json::from_str(&raw)
    {   Ok(v) => v
      , Err(_) => return Err(crate::error::Error::NonJson(raw))
    };

    let text = match data.get("text")
    {   Some(serde_json::Value::String(s)) => s.clone()
      , _ => return Err(crate::error::Error::MissingText(raw))
    };

    Ok(InferenceResult
    {   text
      , usage: data.get("usage").cloned()
    })
}
