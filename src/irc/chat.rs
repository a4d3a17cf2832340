//! Chat messages received from Bancho.

use std::fmt::Display;

use super::IrcMessage;

/// Marks the start and end of a CTCP request.
const CTCP_DELIM: char = '\x01';

/// Where a chat message was sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChatTarget {
    /// A public channel like `#osu`.
    Channel(String),
    /// A private message to the bot account.
    Private,
}

impl Display for ChatTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatTarget::Channel(name) => f.write_str(name),
            ChatTarget::Private => f.write_str("private"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Message,
    /// `/me` messages. osu! also sends `/np` this way.
    Action,
}

/// A `PRIVMSG` from another player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// IRC nick of the sender. Spaces in osu! names become underscores.
    pub sender: String,
    pub target: ChatTarget,
    /// The text. For actions, the text after `ACTION`.
    pub content: String,
    pub kind: ChatKind,
}

impl ChatMessage {
    /// Convert a `PRIVMSG`. CTCP requests other than `ACTION` give `None`.
    pub fn from_irc(message: &IrcMessage) -> Option<Self> {
        if message.command != "PRIVMSG" {
            return None;
        }

        let sender = message.nick()?;
        let target = message.param(0)?;
        let text = message.param(1)?;

        let (kind, content) = match text.strip_prefix(CTCP_DELIM) {
            Some(ctcp) => {
                let ctcp = ctcp.strip_suffix(CTCP_DELIM).unwrap_or(ctcp);
                let body = ctcp.strip_prefix("ACTION")?;
                if !(body.is_empty() || body.starts_with(' ')) {
                    return None;
                }
                (ChatKind::Action, body.trim().to_string())
            }
            None => (ChatKind::Message, text.to_string()),
        };

        let target = if target.starts_with('#') {
            ChatTarget::Channel(target.to_string())
        } else {
            ChatTarget::Private
        };

        Some(Self {
            sender: sender.to_string(),
            target,
            content,
            kind,
        })
    }
}
