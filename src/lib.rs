pub mod error;
pub mod config;
pub mod request;
pub mod inference;
pub mod telegram;
pub mod handler;
pub mod backoff;
pub mod client;

pub use client::RelayBackend;
pub use config::RelayConfig;
pub use inference::InferenceClient;
pub use request::InferenceResult;

/*

airelay: relays Telegram text messages to an inference endpoint
and sends the generated text back to the same chat.

airelay/
├── Cargo.toml
├── src/
│   ├── main.rs         # Logging, config, signals
│   ├── lib.rs          # Re-exports and the backend channel types
│   ├── error.rs        # Error type and user-facing messages
│   ├── config.rs       # Environment configuration
│   ├── request.rs      # Inference wire bodies and response parsing
│   ├── inference.rs    # The relay call (POST, 30s bound)
│   ├── telegram/       # Bot API client and update types
│   ├── handler.rs      # One update in, one reply out
│   ├── backoff.rs      # Pacing for failed polls
│   └── client.rs       # Poll loop and shutdown
└── tests/

*/

/// RELAY API INTERFACE:

// ===== Shutdown =====

pub type ShutdownReply = Result<(), crate::error::Error>;
pub type ShutdownReplySender
  = tokio::sync::mpsc::UnboundedSender<ShutdownReply>;

pub struct ShutdownArgs
{   pub reply: ShutdownReplySender
}

// ===== RelayHand (sender side) =====

pub struct RelayHand
{   pub shutdown_tx
      : tokio::sync::mpsc::UnboundedSender<ShutdownArgs>
}

// ===== RelayFoot (receiver side) =====

pub struct RelayFoot
{   pub shutdown_rx
      : tokio::sync::mpsc::UnboundedReceiver<ShutdownArgs>
}
