//! Setup of the Discord side of the relay.

mod config;
mod framework;

use crate::data::RelayStatus;
use crate::serenity;
use crate::RelayError;

pub use config::Config;

/// Constructs a [serenity::Client] whose framework shares `status` with the relay.
pub(super) async fn client(
    config: Config,
    status: RelayStatus,
) -> Result<serenity::Client, RelayError> {
    // Get discord token from config file
    let token = config.token()?.to_string();

    // The relay only posts, it never reads guild messages.
    // See https://discord.com/developers/docs/topics/gateway#gateway-intents
    let intents = serenity::GatewayIntents::non_privileged();

    let client = serenity::ClientBuilder::new(token, intents)
        .framework(framework::framework(config, status))
        .await?;

    Ok(client)
}
