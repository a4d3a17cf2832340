//! Implements the `/status` command.
//!
//! The bot responds with an embed describing the Bancho connection and
//! how many messages have been relayed.

use itertools::Itertools;
use poise::CreateReply;
use serenity::CreateEmbed;
use tracing::instrument;

use crate::data::{format_duration, StatusSnapshot};
use crate::serenity;
use crate::Context;
use crate::RelayError;

/// Show the state of the Bancho relay
#[instrument(skip(ctx))]
#[poise::command(slash_command, channel_cooldown = 5)]
pub async fn status(ctx: Context<'_>) -> Result<(), RelayError> {
    let data = ctx.data();
    let snapshot = data.status.snapshot().await;

    let embed = status_embed(&snapshot, &data.routes.describe(), data.colour);
    ctx.send(CreateReply::default().embed(embed)).await?;

    Ok(())
}

fn status_embed(snapshot: &StatusSnapshot, routes: &str, colour: u32) -> CreateEmbed {
    let connection = match snapshot.uptime {
        Some(uptime) => format!("Connected to Bancho for {}", format_duration(&uptime)),
        None => "Disconnected from Bancho, reconnecting...".to_string(),
    };

    let channels = if snapshot.channels.is_empty() {
        "None".to_string()
    } else {
        snapshot.channels.iter().map(|c| format!("`{c}`")).join(", ")
    };

    let routes = if routes.is_empty() { "None" } else { routes };

    CreateEmbed::default()
        .title("Bancho relay")
        .description(connection)
        .field("Joined channels", channels, false)
        .field("Routes", routes, false)
        .field("Relayed", snapshot.relayed.to_string(), true)
        .field("Failed", snapshot.failed.to_string(), true)
        .colour(colour)
}
