//! Parsing and serializing single IRC lines.

use std::fmt::Display;

/// One IRC protocol message. The trailing parameter, if any, is the last
/// element of `params`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl IrcMessage {
    /// Construct an outgoing message without prefix.
    pub fn new<I, S>(command: &str, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefix: None,
            command: command.to_string(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a line received from the server. Returns `None` for blank or
    /// commandless lines.
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']).trim_start();
        if rest.is_empty() {
            return None;
        }

        let prefix = match rest.strip_prefix(':') {
            Some(stripped) => {
                let (prefix, remainder) = stripped.split_once(' ')?;
                rest = remainder.trim_start();
                Some(prefix.to_string())
            }
            None => None,
        };

        let (middle, trailing) = match rest.split_once(" :") {
            Some((middle, trailing)) => (middle, Some(trailing)),
            None => (rest, None),
        };

        let mut words = middle.split(' ').filter(|word| !word.is_empty());
        let command = words.next()?.to_ascii_uppercase();
        let mut params: Vec<String> = words.map(str::to_string).collect();
        params.extend(trailing.map(str::to_string));

        Some(Self {
            prefix,
            command,
            params,
        })
    }

    /// Nickname part of the prefix (`nick!user@host`).
    pub fn nick(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .map(|prefix| prefix.split_once('!').map_or(prefix, |(nick, _)| nick))
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }
}

/// Wire format without the line ending. CR and LF are dropped from params.
impl Display for IrcMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }
        f.write_str(&self.command)?;

        let last = self.params.len().saturating_sub(1);
        for (index, param) in self.params.iter().enumerate() {
            let param: String = param.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
            let needs_colon = param.is_empty() || param.contains(' ') || param.starts_with(':');

            if index == last && needs_colon {
                write!(f, " :{param}")?;
            } else {
                write!(f, " {param}")?;
            }
        }
        Ok(())
    }
}
