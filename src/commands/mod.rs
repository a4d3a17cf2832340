//! Bot commands.

mod status;

use crate::{Data, RelayError};

/// Convenient type alias for [poise::Command].
pub type Command = poise::Command<Data, RelayError>;

/// Lists all the implemented commands
pub fn list() -> Vec<Command> {
    vec![status::status()]
}
