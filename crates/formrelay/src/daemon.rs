//! Process entry points wiring the front door and decoder together.
//!
//! Each entry point runs until Ctrl-C or until one of its loops fails.
//! On interrupt, in-flight work is abandoned; sockets close as they drop.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::Config;
use crate::decoder::Decoder;
use crate::error::{Error, Result};
use crate::http::{AppState, Assets, FrontDoor};
use crate::relay::{self, Inbox, Relay, Transport, UdpInbox, UdpRelay};
use crate::store::Store;

/// Run the front door and the decoder in one process.
///
/// # Errors
///
/// Returns an error if a socket cannot be bound or a loop fails.
pub async fn run_all(config: &Config) -> Result<()> {
    let decoder = Decoder::new(Store::new(config.data_path()));
    info!("Starting front door and decoder ({} transport)", config.relay.transport);

    match config.relay.transport {
        Transport::Udp => {
            let inbox = UdpInbox::bind(config.relay_addr()?, config.relay.buffer_size).await?;
            let relay = UdpRelay::bind(config.relay_addr()?).await?;
            let front_door = bind_front_door(config, Arc::new(relay)).await?;
            until_shutdown(run_pair(front_door, decoder, inbox)).await
        }
        Transport::Channel => {
            let (relay, inbox) =
                relay::channel(config.relay.queue_capacity, config.relay.buffer_size);
            let front_door = bind_front_door(config, Arc::new(relay)).await?;
            until_shutdown(run_pair(front_door, decoder, inbox)).await
        }
    }
}

/// Run only the front door, relaying over UDP to a separate decoder.
///
/// # Errors
///
/// Returns an error if a socket cannot be bound or the listener fails.
pub async fn run_front_door(config: &Config) -> Result<()> {
    let relay = UdpRelay::bind(config.relay_addr()?).await?;
    info!("Relaying form posts to decoder at {}", relay.target());
    let front_door = bind_front_door(config, Arc::new(relay)).await?;
    until_shutdown(front_door.run()).await
}

/// Run only the decoder, listening on UDP.
///
/// # Errors
///
/// Returns an error if the socket cannot be bound or receiving fails.
pub async fn run_decoder(config: &Config) -> Result<()> {
    let addr = config.relay_addr()?;
    let inbox = UdpInbox::bind(addr, config.relay.buffer_size).await?;
    info!("Decoder listening on udp://{}", addr);
    let decoder = Decoder::new(Store::new(config.data_path()));
    until_shutdown(decoder.run(inbox)).await
}

async fn bind_front_door(config: &Config, relay: Arc<dyn Relay>) -> Result<FrontDoor> {
    debug!("Front door relaying over {} transport", relay.transport());
    let state = AppState::new(relay, Assets::from_config(&config.assets));
    FrontDoor::bind(config.http_addr()?, state).await
}

/// Serve HTTP while the decoder runs on its own task.
///
/// Returns as soon as either side stops.
async fn run_pair<I>(front_door: FrontDoor, decoder: Decoder, inbox: I) -> Result<()>
where
    I: Inbox + 'static,
{
    let mut decoding = tokio::spawn(async move { decoder.run(inbox).await });

    let result = tokio::select! {
        result = front_door.run() => result,
        joined = &mut decoding => joined
            .map_err(|e| Error::internal(format!("decoder task failed: {e}")))?,
    };

    decoding.abort();
    result
}

async fn until_shutdown<F>(work: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    tokio::select! {
        result = work => result,
        () = shutdown_signal() => {
            info!("Interrupt received, shutting down");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for interrupt: {e}");
        std::future::pending::<()>().await;
    }
}
