//! Setup for [poise::Framework]

use crate::commands;
use crate::data::RelayStatus;
use crate::serenity;
use crate::Config;
use crate::Data;
use crate::RelayError;

/// Convenient type alias, only this [poise::Framework] type is used.
type Framework = poise::Framework<Data, RelayError>;

/// Construct a [poise::Framework]
pub(super) fn framework(config: Config, status: RelayStatus) -> Framework {
    poise::Framework::builder()
        .options(framework_options())
        .setup(|ctx, rdy, fw| framework_setup(ctx, rdy, fw, config, status))
        .build()
}

/// Configure options for the [Framework]
fn framework_options() -> poise::FrameworkOptions<Data, RelayError> {
    poise::FrameworkOptions {
        // Add commands to the framework
        commands: commands::list(),
        // Handle framework errors
        on_error: |e| crate::log::handle_framework_error(e),
        // Log when commands start
        pre_command: |ctx| {
            Box::pin(async move {
                let cmd_name = &ctx.command().name;
                let user = &ctx.author().name;
                tracing::info!("Started '{cmd_name}' command from {user}.")
            })
        },
        // Log when finishing commands
        post_command: |ctx| {
            Box::pin(async move {
                let cmd_name = &ctx.command().name;
                let user = &ctx.author().name;
                tracing::info!("Finished '{cmd_name}' command from {user}.")
            })
        },
        ..Default::default()
    }
}

/// Construct future that runs on the first READY
fn framework_setup<'a>(
    ctx: &'a serenity::Context,
    rdy: &'a serenity::Ready,
    fw: &'a Framework,
    config: Config,
    status: RelayStatus,
) -> poise::BoxFuture<'a, Result<Data, RelayError>> {
    Box::pin(async move {
        // Register the commands
        let commands = &commands::list();
        let app_commands = poise::builtins::create_application_commands(commands);

        serenity::Command::set_global_commands(ctx, app_commands.clone()).await?;
        if let Some(dev_guild) = config.dev_guild() {
            // This is faster than global registers, useful for development.
            tracing::info!("Registering commands on dev guild.");
            dev_guild.set_commands(ctx, app_commands).await?;
        }

        // Simple message that logs when the bot has initialized
        let bot_name = &rdy.user.name;
        tracing::info!("[DISCORD] {bot_name} is ready!");

        let data = Data {
            notify_list: config.notify_list(fw),
            status,
            routes: config.routes()?,
            colour: config.embed_colour()?,
        };

        Ok(data)
    })
}
