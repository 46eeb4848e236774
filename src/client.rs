use tokio::sync::mpsc;
use tokio::task::JoinSet;
use log::{debug, error, info, warn};

use crate::backoff::PollBackoff;
use crate::inference::InferenceClient;
use crate::telegram::TelegramClient;
use crate::RelayFoot;

/// Everything the poll loop owns
pub struct RelayState
{   pub telegram: TelegramClient
  , pub inference: InferenceClient
  , pub poll_timeout_secs: u64
}

/// Public API for the relay - owns the polling task
pub struct RelayBackend
{   hand: crate::RelayHand
  , bot: crate::telegram::types::User
  , _task_handle: tokio::task::JoinHandle<()>
}

impl std::fmt::Debug for RelayBackend
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   f.debug_struct("RelayBackend")
          .field("bot", &self.bot)
          .field("running", &!self._task_handle.is_finished())
          .finish_non_exhaustive()
    }
}

impl RelayBackend
{   /// Verify the bot token, then spawn the poll loop.
    /// Fails without spawning if Telegram rejects the token.
    pub async fn start(
      config: crate::config::RelayConfig
    ) -> Result<Self, crate::error::Error>
    {   debug!("Creating RelayBackend");

        let telegram = TelegramClient::from_config(&config)?;
        let inference = InferenceClient::from_config(&config)?;

        let bot = telegram.get_me().await.map_err(|e| {
          error!("Bot token verification failed: {}", e);
          e
        })?;

        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();

        let hand = crate::RelayHand { shutdown_tx };
        let foot = crate::RelayFoot { shutdown_rx };

        let state = RelayState
        {   telegram
          , inference
          , poll_timeout_secs: config.poll_timeout_secs
        };

        let _task_handle = tokio::spawn(async move {
          run_relay_loop(foot, state).await
        });

        info!(
          "Bot started as @{}",
          bot.username.as_deref().unwrap_or(&bot.first_name)
        );

        Ok(RelayBackend
        {   hand
          , bot
          , _task_handle
        })
    }

    /// Identity reported by getMe at startup
    pub fn bot(&self) -> &crate::telegram::types::User
    {   &self.bot
    }

    /// Stop polling, let in-flight messages finish, then return
    pub async fn shutdown(self)
      -> Result<(), crate::error::Error>
    {   debug!("Shutting down RelayBackend");
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();

        let cmd = crate::ShutdownArgs
        {   reply: reply_tx
        };

        self.hand.shutdown_tx
          .send(cmd)
          .map_err(|_| {
            error!("Relay channel already closed");
            crate::error::Error::Other(
              "Relay already shutdown".to_string()
            )
          })?;

        // Wait for shutdown confirmation
        if let Some(result) = reply_rx.recv().await
        {   debug!("Relay shutdown confirmed");
            result
        } else
        {   error!("Relay loop exited without confirming shutdown");
            Err(crate::error::Error::Other(
              "Relay loop gone".to_string()
            ))
        }
    }
}

/// Main poll loop
///
/// Each update is spawned onto its own task and the loop goes straight
/// back to polling; no handler is awaited here.
async fn run_relay_loop(
  foot: RelayFoot
, state: RelayState
)
{   debug!("Starting relay poll loop");
    let RelayFoot { mut shutdown_rx } = foot;
    let mut handlers = JoinSet::new();
    let mut backoff = PollBackoff::default();
    let mut offset: Option<i64> = None;

    let shutdown_reply = loop
    { tokio::select!
      { biased;

        cmd = shutdown_rx.recv() => {
          debug!("Received Shutdown");
          break cmd.map(|c| c.reply);
        }
      , polled = state.telegram.get_updates(
          offset, state.poll_timeout_secs
        ) => {
          match polled
          {   Ok(updates) => {
                backoff.reset();
                reap_finished(&mut handlers);
                if !updates.is_empty()
                {   debug!("Polled {} updates", updates.len());
                }
                for update in updates
                {   offset = Some(update.update_id + 1);
                    let telegram = state.telegram.clone();
                    let inference = state.inference.clone();
                    handlers.spawn(async move {
                      crate::handler::handle_update(
                        &telegram, &inference, update
                      ).await
                    });
                }
              }
            , Err(e) => {
                let delay = backoff.next_delay();
                warn!("getUpdates failed: {}, retrying in {:?}", e, delay);
                tokio::select!
                { cmd = shutdown_rx.recv() => {
                    debug!("Received Shutdown during backoff");
                    break cmd.map(|c| c.reply);
                  }
                , _ = tokio::time::sleep(delay) => {}
                }
              }
          }
        }
      }
    };

    // Acknowledge the last batch so a restart does not redeliver it
    if offset.is_some()
    {   if let Err(e) = state.telegram.get_updates(offset, 0).await
        {   warn!("Could not acknowledge final offset: {}", e);
        }
    }

    if !handlers.is_empty()
    {   info!("Waiting for {} in-flight messages", handlers.len());
    }
    while let Some(joined) = handlers.join_next().await
    {   if let Err(e) = joined
        {   error!("Message handler panicked: {}", e);
        }
    }

    info!("Relay stopped");
    if let Some(reply) = shutdown_reply
    {   let _ = reply.send(Ok(()));
    }
}

/// Collect handlers that already finished, without waiting
fn reap_finished(handlers: &mut JoinSet<crate::handler::Outcome>)
{   while let Some(joined) = handlers.try_join_next()
    {   match joined
        {   Ok(outcome) => debug!("Handler finished: {:?}", outcome)
          , Err(e) => error!("Message handler panicked: {}", e)
        }
    }
}
