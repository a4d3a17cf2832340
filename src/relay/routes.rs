//! Which Discord channel each IRC channel is relayed to.

use std::collections::HashSet;

use serenity::ChannelId;

use crate::error::ConfigError;
use crate::irc::{ChatMessage, ChatTarget};
use crate::serenity;

/// Relay destinations, validated from the config.
#[derive(Debug, Clone, Default)]
pub struct Routes {
    /// Lowercase IRC channel name and its destination.
    channels: Vec<(String, ChannelId)>,
    /// Destination for private messages to the bot account.
    private: Option<ChannelId>,
}

impl Routes {
    /// Build routes from `(irc channel, discord channel id)` pairs.
    ///
    /// Channel names must start with `#`, ids must be non-zero and no IRC
    /// channel may be routed twice.
    pub fn new<'a>(
        channels: impl IntoIterator<Item = (&'a str, u64)>,
        private: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut routes = Vec::new();

        for (irc_channel, discord_channel) in channels {
            let name = irc_channel.trim().to_lowercase();
            if !name.starts_with('#') || name.len() < 2 {
                return Err(ConfigError::InvalidConfig {
                    reason: format!("IRC channel '{irc_channel}' must start with '#'"),
                });
            }
            if !seen.insert(name.clone()) {
                return Err(ConfigError::InvalidConfig {
                    reason: format!("IRC channel '{irc_channel}' is routed more than once"),
                });
            }
            routes.push((name, channel_id(discord_channel, irc_channel)?));
        }

        let private = private
            .map(|id| channel_id(id, "private messages"))
            .transpose()?;

        Ok(Self {
            channels: routes,
            private,
        })
    }

    /// Where a chat message should be posted, if anywhere.
    pub fn destination(&self, chat: &ChatMessage) -> Option<ChannelId> {
        match &chat.target {
            ChatTarget::Private => self.private,
            ChatTarget::Channel(name) => self
                .channels
                .iter()
                .find(|(irc, _)| irc.eq_ignore_ascii_case(name))
                .map(|(_, discord)| *discord),
        }
    }

    /// IRC channels to join.
    pub fn irc_channels(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|(irc, _)| irc.as_str())
    }

    /// One line per route, with Discord channel mentions.
    pub fn describe(&self) -> String {
        let channels = self
            .channels
            .iter()
            .map(|(irc, discord)| format!("`{irc}` → <#{discord}>"));
        let private = self
            .private
            .iter()
            .map(|discord| format!("`private` → <#{discord}>"));

        channels.chain(private).collect::<Vec<_>>().join("\n")
    }
}

fn channel_id(id: u64, route: &str) -> Result<ChannelId, ConfigError> {
    if id == 0 {
        return Err(ConfigError::InvalidConfig {
            reason: format!("Missing Discord channel id for {route}"),
        });
    }
    Ok(ChannelId::new(id))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::irc::ChatKind;

    fn chat(target: ChatTarget) -> ChatMessage {
        ChatMessage {
            sender: "someone".to_string(),
            target,
            content: "hi".to_string(),
            kind: ChatKind::Message,
        }
    }

    #[test]
    fn routes_channels_case_insensitively() {
        let routes = Routes::new([("#osu", 10), ("#Indonesian", 20)], None).unwrap();

        let osu = chat(ChatTarget::Channel("#OSU".to_string()));
        let indo = chat(ChatTarget::Channel("#indonesian".to_string()));
        let other = chat(ChatTarget::Channel("#lobby".to_string()));

        assert_eq!(routes.destination(&osu), Some(ChannelId::new(10)));
        assert_eq!(routes.destination(&indo), Some(ChannelId::new(20)));
        assert_eq!(routes.destination(&other), None);
        assert_eq!(routes.destination(&chat(ChatTarget::Private)), None);
        assert_eq!(
            routes.irc_channels().collect::<Vec<_>>(),
            vec!["#osu", "#indonesian"]
        );
    }

    #[test]
    fn routes_private_messages() {
        let routes = Routes::new([("#osu", 10)], Some(30)).unwrap();
        assert_eq!(
            routes.destination(&chat(ChatTarget::Private)),
            Some(ChannelId::new(30))
        );
        assert_eq!(
            routes.describe(),
            "`#osu` → <#10>\n`private` → <#30>"
        );
    }

    #[test]
    fn rejects_invalid_routes() {
        assert!(Routes::new([("osu", 10)], None).is_err());
        assert!(Routes::new([("#", 10)], None).is_err());
        assert!(Routes::new([("#osu", 0)], None).is_err());
        assert!(Routes::new([("#osu", 10), ("#OSU", 20)], None).is_err());
        assert!(Routes::new([("#osu", 10)], Some(0)).is_err());
    }
}
