//! Error types used throughout the relay.

use std::time::Duration;

use thiserror::Error;

use crate::serenity;

/// The top-level error type, also used as the [poise] error type.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Errors caused by (and shown to) a Discord user.
    #[error(transparent)]
    UserError(#[from] UserError),

    #[error(transparent)]
    ConfigError(#[from] ConfigError),

    #[error("Bancho error: {0}")]
    IrcError(#[from] IrcError),

    #[error("osu! API error: {0}")]
    OsuApiError(#[from] OsuApiError),

    #[error("Discord error: {0}")]
    SerenityError(#[from] serenity::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("A task panicked: {payload:?}")]
    Panic { payload: Option<String> },

    #[error("Command check failed: {reason:?}")]
    CheckFailed { reason: Option<String> },

    #[error("Command structure mismatch: {description}")]
    CommandStructureMismatch { description: String },
}

impl RelayError {
    /// Errors after which retrying makes no sense, so the relay stops.
    pub fn is_fatal(&self) -> bool {
        match self {
            RelayError::IrcError(error) => error.is_fatal(),
            RelayError::OsuApiError(error) => error.is_fatal(),
            _ => false,
        }
    }
}

/// Errors that are the user's fault, replied to ephemerally.
#[derive(Error, Debug)]
pub enum UserError {
    #[error("Slow down! Try again in {} seconds.", remaining_cooldown.as_secs().max(1))]
    OnCooldown { remaining_cooldown: Duration },

    #[error("I'm missing these permissions here: {missing_permissions}")]
    MissingBotPermissions {
        missing_permissions: serenity::Permissions,
    },
}

/// Errors while reading or validating `config.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing config file. {action_msg}")]
    MissingConfig { action_msg: String },

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Could not access config file: {0}")]
    IoError(std::io::Error),
}

/// Errors of a single Bancho session.
#[derive(Error, Debug)]
pub enum IrcError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("authentication failed: {reason}")]
    Authentication { reason: String },

    #[error("nothing received from the server in time")]
    Timeout,

    #[error("connection closed by the server")]
    Closed,

    #[error("the server sent a line longer than {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("the relay stopped accepting messages")]
    RelayClosed,
}

impl IrcError {
    /// Fatal errors stop the client instead of reconnecting.
    pub fn is_fatal(&self) -> bool {
        matches!(self, IrcError::Authentication { .. } | IrcError::RelayClosed)
    }
}

/// Errors from the osu! v1 web API.
#[derive(Error, Debug)]
pub enum OsuApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected response status {status}")]
    Status { status: reqwest::StatusCode },

    #[error("the api key was rejected")]
    InvalidKey,
}

impl OsuApiError {
    /// A rejected key fails every later lookup too.
    pub fn is_fatal(&self) -> bool {
        matches!(self, OsuApiError::InvalidKey)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fatal_errors() {
        let auth: RelayError = IrcError::Authentication {
            reason: "Bad authentication token.".to_string(),
        }
        .into();
        assert!(auth.is_fatal());
        assert!(RelayError::from(OsuApiError::InvalidKey).is_fatal());

        assert!(!RelayError::from(IrcError::Timeout).is_fatal());
        assert!(!RelayError::from(IrcError::Closed).is_fatal());
        let status = OsuApiError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
        };
        assert!(!RelayError::from(status).is_fatal());
    }

    #[test]
    fn cooldown_rounds_up_to_a_second() {
        let error = UserError::OnCooldown {
            remaining_cooldown: Duration::from_millis(300),
        };
        assert_eq!(error.to_string(), "Slow down! Try again in 1 seconds.");
    }
}
