use std::process::ExitCode;

use poise::serenity_prelude as serenity;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinError;
use tracing::{error, info, warn};

mod commands;
mod data;
mod error;
mod irc;
mod log;
mod osu;
mod relay;
mod setup;

pub use data::Data;
pub use error::RelayError;
pub use setup::Config;

use data::RelayStatus;
use irc::BanchoClient;
use osu::{CachedLookup, OsuApi};
use relay::Relay;

/// Convenient type alias for the poise context.
type Context<'a> = poise::Context<'a, Data, RelayError>;

/// Chat messages buffered between Bancho and the relay.
const CHAT_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::read() {
        Ok(config) => config,
        Err(e) => {
            // Tracing is configured by the config file, so it isn't up yet
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Must stay alive until the end of main, or file logs are lost
    let _guard = log::install_tracing(&config);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Runs Bancho, the relay and Discord until one of them stops or ctrl-c is pressed.
async fn run(config: Config) -> Result<(), RelayError> {
    config.validate()?;

    let status = RelayStatus::default();
    let mut client = setup::client(config.clone(), status.clone()).await?;

    let (chat_tx, chat_rx) = mpsc::channel(CHAT_BUFFER);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let lookup = CachedLookup::new(OsuApi::new(config.osu_api_key()?)?, config.user_cache_ttl());
    let relay = Relay::builder()
        .lookup(lookup)
        .sink(client.http.clone())
        .routes(config.routes()?)
        .status(status.clone())
        .colour(config.embed_colour()?)
        .concurrency(config.concurrency())
        .build();
    let mut relay = tokio::spawn(relay.run(chat_rx));

    let bancho = BanchoClient::new(config.irc_settings()?, status, chat_tx);
    let mut bancho = tokio::spawn(bancho.run(shutdown_rx));

    let shard_manager = client.shard_manager.clone();
    let mut discord = tokio::spawn(async move { client.start().await });

    let (trigger, result) = tokio::select! {
        res = &mut bancho => {
            warn!("[BANCHO] Client stopped.");
            (Trigger::Bancho, flatten(res))
        }
        res = &mut relay => (Trigger::Relay, flatten(res)),
        res = &mut discord => {
            warn!("[DISCORD] Client stopped.");
            (Trigger::Discord, flatten(res))
        }
        res = tokio::signal::ctrl_c() => {
            info!("Received ctrl-c, shutting down.");
            (Trigger::CtrlC, res.map_err(RelayError::from))
        }
    };

    let _ = shutdown_tx.send(true);
    shard_manager.shutdown_all().await;

    // A finished JoinHandle must not be polled again
    if trigger != Trigger::Bancho {
        if let Err(e) = flatten(bancho.await) {
            warn!("[BANCHO] Error while shutting down: {e}");
        }
    }
    if trigger != Trigger::Discord {
        discord.abort();
    }
    // The relay drains what Bancho already sent once the chat sender is dropped
    if trigger != Trigger::Relay {
        if let Err(e) = flatten(relay.await) {
            warn!("Relay error while shutting down: {e}");
        }
    }

    result
}

/// Which task ended the [run].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Bancho,
    Relay,
    Discord,
    CtrlC,
}

/// Flattens the result of a spawned task.
fn flatten<T, E>(res: Result<Result<T, E>, JoinError>) -> Result<(), RelayError>
where
    E: Into<RelayError>,
{
    match res {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(e.into()),
        Err(e) => Err(RelayError::Panic {
            payload: Some(e.to_string()),
        }),
    }
}
