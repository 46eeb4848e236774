use log::{error, info};

use airelay::{RelayBackend, RelayConfig};

#[tokio::main]
async fn main() -> Result<(), airelay::error::Error>
{   env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("info")
    ).init();

    let config = RelayConfig::from_env().map_err(|e| {
      error!("{}", e);
      e
    })?;

    let backend = RelayBackend::start(config).await?;

    let signal = shutdown_signal().await;
    info!("Received {}, stopping", signal);

    backend.shutdown().await
}

/// Resolve on the first SIGINT or SIGTERM
#[cfg(unix)]
async fn shutdown_signal() -> &'static str
{   use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate())
    {   Ok(s) => s
      , Err(e) => {
          error!("Cannot listen for SIGTERM: {}", e);
          let _ = tokio::signal::ctrl_c().await;
          return "SIGINT";
        }
    };

    tokio::select!
    { _ = tokio::signal::ctrl_c() => "SIGINT"
    , _ = term.recv() => "SIGTERM"
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> &'static str
{   let _ = tokio::signal::ctrl_c().await;
    "SIGINT"
}
