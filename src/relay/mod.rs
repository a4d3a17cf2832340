//! Turns Bancho chat into Discord embeds.
//!
//! Messages are prepared concurrently (osu! lookups are the slow part) but
//! delivered to Discord in the order they arrived on Bancho.

pub mod embed;
mod links;
mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serenity::{ChannelId, CreateEmbed, CreateMessage, Http};
use tokio::sync::mpsc;
use tracing::{debug, error, instrument, warn};

use crate::data::RelayStatus;
use crate::error::OsuApiError;
use crate::irc::{ChatKind, ChatMessage};
use crate::osu::OsuLookup;
use crate::serenity;
use crate::RelayError;

pub use routes::Routes;

/// Somewhere to post embeds to.
#[async_trait]
pub trait DiscordSink: Send + Sync {
    async fn send(&self, channel: ChannelId, embeds: Vec<CreateEmbed>) -> Result<(), RelayError>;
}

#[async_trait]
impl DiscordSink for Arc<Http> {
    async fn send(&self, channel: ChannelId, embeds: Vec<CreateEmbed>) -> Result<(), RelayError> {
        let message = CreateMessage::new().embeds(embeds);
        channel.send_message(&**self, message).await?;
        Ok(())
    }
}

/// A prepared message, ready to be posted.
#[derive(Debug)]
struct Outgoing {
    channel: ChannelId,
    sender: String,
    embeds: Vec<CreateEmbed>,
}

/// Forwards [ChatMessage]s to Discord.
#[derive(bon::Builder)]
pub struct Relay<L, S> {
    lookup: L,
    sink: S,
    routes: Routes,
    status: RelayStatus,
    /// Embed colour.
    colour: u32,
    /// How many messages are prepared at once.
    #[builder(default = 4)]
    concurrency: usize,
}

impl<L: OsuLookup, S: DiscordSink> Relay<L, S> {
    /// Relay until every sender of `rx` is dropped, or until a lookup fails
    /// in a way retrying can't fix.
    pub async fn run(self, rx: mpsc::Receiver<ChatMessage>) -> Result<(), RelayError> {
        let relay = &self;

        let chats = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chat| (chat, rx))
        });

        let result = chats
            .map(|chat| relay.prepare(chat))
            .buffered(relay.concurrency.max(1))
            .try_for_each(|outgoing| async move {
                if let Some(outgoing) = outgoing {
                    relay.deliver(outgoing).await;
                }
                Ok(())
            })
            .await;

        match &result {
            Ok(()) => tracing::info!("Relay stopped."),
            Err(e) => error!("Relay stopped: {e}"),
        }
        result
    }

    /// Look up everything needed and build the embeds.
    #[instrument(level = "debug", skip_all, fields(sender = %chat.sender, target = %chat.target))]
    async fn prepare(&self, chat: ChatMessage) -> Result<Option<Outgoing>, RelayError> {
        let Some(channel) = self.routes.destination(&chat) else {
            debug!("No route, dropping message.");
            return Ok(None);
        };

        let user = recover(self.lookup.user(&chat.sender).await, &chat.sender)?;
        if user.is_none() {
            debug!("No osu! profile found for {}", chat.sender);
        }

        let mut embeds = vec![embed::player(&chat, user.as_ref(), self.colour)];

        if chat.kind == ChatKind::Action {
            if let Some(query) = links::beatmap_link(&chat.content) {
                let maps = self.lookup.beatmaps(query).await.map(Some);
                let maps = recover(maps, format!("{query:?}"))?;
                // A mapset link shows its first difficulty
                match maps.and_then(|maps| maps.into_iter().next()) {
                    Some(map) => embeds.push(embed::beatmap(&map, self.colour)),
                    None => debug!("No beatmap found for {query:?}"),
                }
            }
        }

        Ok(Some(Outgoing {
            channel,
            sender: chat.sender,
            embeds,
        }))
    }

    async fn deliver(&self, outgoing: Outgoing) {
        let Outgoing {
            channel,
            sender,
            embeds,
        } = outgoing;

        match self.sink.send(channel, embeds).await {
            Ok(()) => {
                debug!("Relayed message from {sender} to {channel}");
                self.status.record_relayed().await;
            }
            Err(e) => {
                error!("Failed to relay message from {sender} to {channel}: {e}");
                self.status.record_failed().await;
            }
        }
    }
}

/// A failed lookup only costs the embed its details, unless it is fatal.
fn recover<T>(
    result: Result<Option<T>, OsuApiError>,
    what: impl std::fmt::Display,
) -> Result<Option<T>, RelayError> {
    match result.map_err(RelayError::from) {
        Ok(found) => Ok(found),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!("Failed to look up {what}: {e}");
            Ok(None)
        }
    }
}
