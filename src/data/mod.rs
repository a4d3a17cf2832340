//! This module contains everything relating to [Data].

mod status;

use std::collections::HashSet;

use serenity::UserId;

use crate::relay::Routes;
use crate::serenity;
pub use status::format_duration;
pub use status::RelayStatus;
pub use status::StatusSnapshot;

/// The data kept between shards
#[derive(Debug, Default)]
pub struct Data {
    /// List of users to send bug notifications
    pub notify_list: HashSet<UserId>,
    /// Shared with the Bancho client and the relay.
    pub status: RelayStatus,
    /// Where each IRC channel is relayed to.
    pub routes: Routes,
    /// Colour of the bot's embeds.
    pub colour: u32,
}
