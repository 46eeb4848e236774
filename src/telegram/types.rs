use serde::{Deserialize, Serialize};

// ===== Bot API Envelope =====

#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T>
{   pub ok: bool
  , pub result: Option<T>
  , pub description: Option<String>
  , pub error_code: Option<i64>
}

// ===== Inbound Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update
{   pub update_id: i64
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message
{   pub message_id: i64
  , pub chat: Chat
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat
{   pub id: i64
}

#[derive(Debug, Clone, Deserialize)]
pub struct User
{   pub id: i64
  , pub first_name: String
  , #[serde(default)]
    pub username: Option<String>
}

// ===== Outbound Requests =====

#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesRequest
{   #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>
  , pub timeout: u64
  , pub allowed_updates: Vec<String>
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest
{   pub chat_id: i64
  , pub text: String
}

#[derive(Debug, Clone, Serialize)]
pub struct SendChatActionRequest
{   pub chat_id: i64
  , pub action: String
}

// ===== Events =====

/// What the relay does with one update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event
{   /// The /start command
    Start
    {   chat_id: i64
    }
  , /// Any other text, untrimmed
    Text
    {   chat_id: i64
      , text: String
    }
}

impl Update
{   /// Classify the update; non-text updates yield None
    pub fn event(&self) -> Option<Event>
    {   let message = self.message.as_ref()?;
        let text = message.text.as_ref()?;
        let chat_id = message.chat.id;

        if is_start_command(text)
        {   Some(Event::Start { chat_id })
        } else
        {   Some(Event::Text
            {   chat_id
              , text: text.clone()
            })
        }
    }
}

/// `/start`, `/start@SomeBot` and `/start payload` all count
fn is_start_command(text: &str) -> bool
{   let command = text.split_whitespace().next().unwrap_or("");
    let name = command.split('@').next().unwrap_or("");
    name == "/start"
}
