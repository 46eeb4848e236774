//! Per-event handling: one inbound update in, at most one reply out

use log::{debug, error, info, warn};

use crate::inference::InferenceClient;
use crate::telegram::{Event, TelegramClient, Update};

/// Reply to the /start command
pub const GREETING: &str
  = "Hi. Write me a message and I will send it to the AI \
     and bring back the answer.";

/// Prefix on every error reply
pub const ERROR_PREFIX: &str = "❌ Error: ";

/// What a handled update led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome
{   /// Not a text message, or whitespace only
    Ignored
  , /// Greeting sent
    Greeted
  , /// Inference text sent back
    Relayed
  , /// Error reply sent
    Failed(crate::error::Error)
}

/// Format an error the way users see it in chat
pub fn error_reply(err: &crate::error::Error) -> String
{   let msg = err.to_string();
    if msg.is_empty()
    {   format!("{}Unknown error", ERROR_PREFIX)
    } else
    {   format!("{}{}", ERROR_PREFIX, msg)
    }
}

/// Handle one update end to end.
/// Never fails: every error turns into a chat reply or a log line.
pub async fn handle_update(
  telegram: &TelegramClient
, inference: &InferenceClient
, update: Update
) -> Outcome
{   let event = match update.event()
    {   Some(event) => event
      , None => {
          debug!("Update {} ignored (no text)", update.update_id);
          return Outcome::Ignored;
        }
    };

    match event
    {   Event::Start { chat_id } => {
          debug!("Greeting chat {}", chat_id);
          if let Err(e) = telegram.send_message(chat_id, GREETING).await
          {   error!("Failed to greet chat {}: {}", chat_id, e);
          }
          Outcome::Greeted
        }
      , Event::Text { chat_id, text } => {
          relay_text(telegram, inference, chat_id, &text).await
        }
    }
}

/// Relay one chat message through the inference endpoint
pub async fn relay_text(
  telegram: &TelegramClient
, inference: &InferenceClient
, chat_id: i64
, text: &str
) -> Outcome
{   let prompt = text.trim();
    if prompt.is_empty()
    {   debug!("Blank message in chat {} ignored", chat_id);
        return Outcome::Ignored;
    }

    if let Err(e) = telegram.send_typing(chat_id).await
    {   warn!("Typing indicator failed for chat {}: {}", chat_id, e);
    }

    let result = inference.send_prompt(prompt).await;

    let delivered = match result
    {   Ok(reply) => {
          info!(
            "Relayed prompt in chat {} ({} chars back)",
            chat_id,
            reply.text.chars().count()
          );
          telegram.send_message(chat_id, &reply.text).await
        }
      , Err(e) => {
          error!("Error: {}", e);
          let _ = telegram.send_message(chat_id, &error_reply(&e)).await
            .map_err(|send_err| {
              error!(
                "Failed to deliver error reply to chat {}: {}",
                chat_id, send_err
              );
            });
          return Outcome::Failed(e);
        }
    };

    match delivered
    {   Ok(()) => Outcome::Relayed
      , Err(e) => {
          error!("Failed to deliver reply to chat {}: {}", chat_id, e);
          if let Err(send_err)
            = telegram.send_message(chat_id, &error_reply(&e)).await
          {   error!(
                "Failed to deliver error reply to chat {}: {}",
                chat_id, send_err
              );
          }
          Outcome::Failed(e)
        }
    }
}
