//! Bancho (osu! IRC) client.
//!
//! The client logs in, joins the configured channels and forwards every
//! chat message to the relay. When the connection drops it reconnects with
//! exponential backoff and joins the channels again. Only a rejected
//! password (or the relay going away) stops it for good.

mod backoff;
mod chat;
mod connection;
mod message;

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{debug, error, info, trace, warn};

use crate::data::RelayStatus;
use crate::error::IrcError;
use backoff::Backoff;
use connection::Connection;

pub use chat::{ChatKind, ChatMessage, ChatTarget};
pub use message::IrcMessage;

const RPL_WELCOME: &str = "001";
const ERR_NOSUCHCHANNEL: &str = "403";
const ERR_PASSWDMISMATCH: &str = "464";

/// Connection settings for [BanchoClient].
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// IRC nick, spaces already replaced by underscores.
    pub nick: String,
    pub password: String,
    /// Channels to join after every (re)connect.
    pub channels: Vec<String>,
    /// Reconnect if the server is silent for this long.
    pub idle_timeout: Duration,
    pub reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
}

/// A reconnecting Bancho client.
pub struct BanchoClient {
    settings: Settings,
    status: RelayStatus,
    outbox: mpsc::Sender<ChatMessage>,
}

impl BanchoClient {
    pub fn new(settings: Settings, status: RelayStatus, outbox: mpsc::Sender<ChatMessage>) -> Self {
        Self {
            settings,
            status,
            outbox,
        }
    }

    /// Run until `shutdown` flips to `true` (or its sender is dropped), or a
    /// fatal error occurs.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), IrcError> {
        let settings = &self.settings;
        let mut backoff = Backoff::new(settings.reconnect_delay, settings.max_reconnect_delay);

        loop {
            if *shutdown.borrow_and_update() {
                return Ok(());
            }

            let mut registered = false;
            let result = self.session(&mut shutdown, &mut registered).await;
            self.status.set_disconnected().await;

            match result {
                Ok(()) => {
                    info!("[BANCHO] Client stopped.");
                    return Ok(());
                }
                Err(error) if error.is_fatal() => {
                    error!("[BANCHO] Giving up: {error}");
                    return Err(error);
                }
                Err(error) => warn!("[BANCHO] Client disconnected, reason: {error}"),
            }

            if registered {
                backoff.reset();
            }

            let delay = backoff.next_delay();
            info!("[BANCHO] Reconnecting in {delay:?}.");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => return Ok(()),
            }
        }
    }

    /// One connection from login to disconnect. `Ok` means shutdown was requested.
    async fn session(
        &self,
        shutdown: &mut watch::Receiver<bool>,
        registered: &mut bool,
    ) -> Result<(), IrcError> {
        let settings = &self.settings;
        info!("[BANCHO] Connecting to {}:{}", settings.host, settings.port);

        let connect = timeout(
            settings.idle_timeout,
            Connection::connect(&settings.host, settings.port),
        );
        let mut conn = tokio::select! {
            _ = shutdown.changed() => return Ok(()),
            conn = connect => conn.map_err(|_| IrcError::Timeout)??,
        };

        let nick = settings.nick.as_str();
        conn.send(&IrcMessage::new("PASS", [settings.password.as_str()]))
            .await?;
        conn.send(&IrcMessage::new("NICK", [nick])).await?;
        conn.send(&IrcMessage::new("USER", [nick, "0", "*", nick]))
            .await?;

        loop {
            let line = tokio::select! {
                _ = shutdown.changed() => {
                    info!("[BANCHO] Quitting.");
                    conn.send(&IrcMessage::new("QUIT", ["Shutting down"])).await?;
                    return Ok(());
                }
                line = timeout(settings.idle_timeout, conn.read_line()) => {
                    line.map_err(|_| IrcError::Timeout)??
                }
            };

            if let Some(message) = IrcMessage::parse(&line) {
                self.handle(&mut conn, message, registered).await?;
            }
        }
    }

    async fn handle(
        &self,
        conn: &mut Connection,
        message: IrcMessage,
        registered: &mut bool,
    ) -> Result<(), IrcError> {
        match message.command.as_str() {
            "PING" => {
                let pong = IrcMessage {
                    prefix: None,
                    command: "PONG".to_string(),
                    params: message.params,
                };
                conn.send(&pong).await?;
            }
            RPL_WELCOME => {
                info!("[BANCHO] Client connected!");
                *registered = true;
                self.status.set_connected().await;

                for channel in &self.settings.channels {
                    conn.send(&IrcMessage::new("JOIN", [channel.as_str()]))
                        .await?;
                }
            }
            ERR_PASSWDMISMATCH => {
                let reason = message.params.last().cloned().unwrap_or_default();
                return Err(IrcError::Authentication { reason });
            }
            ERR_NOSUCHCHANNEL => {
                let channel = message.param(1).unwrap_or_default();
                warn!("[BANCHO] No such channel: {channel}");
            }
            "JOIN" if self.is_own(message.nick()) => {
                if let Some(channel) = message.param(0) {
                    info!("[BANCHO] Joined {channel}");
                    self.status.joined(channel).await;
                }
            }
            "PART" if self.is_own(message.nick()) => {
                if let Some(channel) = message.param(0) {
                    info!("[BANCHO] Left {channel}");
                    self.status.left(channel).await;
                }
            }
            "KICK" if self.is_own(message.param(1)) => {
                if let Some(channel) = message.param(0) {
                    warn!("[BANCHO] Kicked from {channel}");
                    self.status.left(channel).await;
                }
            }
            "PRIVMSG" => {
                if let Some(chat) = ChatMessage::from_irc(&message) {
                    trace!(sender = %chat.sender, target = %chat.target, "Chat message");
                    self.outbox
                        .send(chat)
                        .await
                        .map_err(|_| IrcError::RelayClosed)?;
                }
            }
            _ => debug!(command = %message.command, "Ignoring message"),
        }
        Ok(())
    }

    fn is_own(&self, nick: Option<&str>) -> bool {
        nick.is_some_and(|nick| nick.eq_ignore_ascii_case(&self.settings.nick))
    }
}
