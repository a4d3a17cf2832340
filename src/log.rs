//! Logging functionality and error reporting.
//! The logging library of choice is [tracing].

use poise::BoxFuture;
use poise::CreateReply;
use poise::FrameworkError;
use serenity::CreateMessage;
use tracing::debug;
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use crate::error::UserError;
use crate::serenity;
use crate::Config;
use crate::Context;
use crate::Data;
use crate::RelayError;

/// The name of this crate, used to set filter target.
const THIS_CRATE: &str = env!("CARGO_CRATE_NAME");

/// Dependencies that are chatty at INFO, e.g. on every gateway heartbeat.
const NOISY: [&str; 4] = ["serenity", "hyper", "h2", "reqwest"];

/// Setup format layers, tracing subscribers, and installs tracing.
/// The returned guard must be held for file logs to be flushed.
pub(super) fn install_tracing(config: &Config) -> Option<WorkerGuard> {
    let debug = config.console_debug();
    let timer = fmt::time::ChronoLocal::rfc_3339();
    let target = targets(debug);

    // File and line numbers are only useful while debugging
    let console_layer = fmt::layer()
        .with_ansi(true)
        .with_file(debug)
        .with_line_number(debug)
        .with_target(true)
        .with_timer(timer.clone())
        .pretty()
        .with_filter(target.clone());

    // Put file logs in `log_dir` as "{THIS_CRATE}.log.{TIMESTAMP}" on an hourly basis.
    let (log_layer, guard) = if config.logs_enabled() {
        let appender = tracing_appender::rolling::hourly(config.log_dir(), format!("{THIS_CRATE}.log"));
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let layer = fmt::layer()
            .with_ansi(false)
            .with_file(debug)
            .with_line_number(debug)
            .with_target(true)
            .with_timer(timer)
            .with_writer(writer)
            .compact()
            .with_filter(target);

        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(log_layer)
        .init();

    guard
}

/// INFO and above by default, WARN for [NOISY] dependencies.
/// `debug` lowers this crate to DEBUG.
fn targets(debug: bool) -> Targets {
    let own_level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    Targets::new()
        .with_default(LevelFilter::INFO)
        .with_targets(NOISY.map(|noisy| (noisy, LevelFilter::WARN)))
        .with_target(THIS_CRATE, own_level)
}

/// Defines various behaviors for how to handle errors.
/// Triggers an [ephemeral_reply] on [UserError]s.
/// Triggers a [notify_bug] on unexpected errors.
pub fn handle_framework_error(err: FrameworkError<Data, RelayError>) -> BoxFuture<()> {
    let handler = async move {
        match err {
            // ---
            // This section includes all errors that should be invisible to users.
            // ---
            FrameworkError::Setup { error, .. } => error!("Error during startup: {error}"),
            FrameworkError::EventHandler { error, event, .. } => {
                let event = event.snake_case_name();
                error!("Error while handling {event} event: {error}")
            }

            // ---
            // This section includes errors that users see but are not logged as error!
            // ---
            FrameworkError::CooldownHit {
                remaining_cooldown,
                ctx,
                ..
            } => {
                let user_error = UserError::OnCooldown { remaining_cooldown };

                Response::builder()
                    .ctx(&ctx)
                    .reply(user_error.to_string())
                    .source(user_error)
                    .build()
                    .send()
                    .await;
            }
            FrameworkError::MissingBotPermissions {
                missing_permissions,
                ctx,
                ..
            } => {
                let user_error = UserError::MissingBotPermissions {
                    missing_permissions,
                };

                Response::builder()
                    .ctx(&ctx)
                    .reply(user_error.to_string())
                    .source(user_error)
                    .build()
                    .send()
                    .await;
            }
            FrameworkError::CommandCheckFailed { error, ctx, .. } => {
                let error = RelayError::CheckFailed {
                    reason: error.map(|e| e.to_string()),
                };

                Response::builder()
                    .ctx(&ctx)
                    .reply(error.to_string())
                    .source(error)
                    .build()
                    .send()
                    .await;
            }

            // ---
            // This section includes errors that users see and are logged as error!
            // These are unexpected errors and should be fixed, so all of them
            // cause a bug notification.
            // ---
            FrameworkError::Command { error, ctx, .. } => {
                Response::builder()
                    .ctx(&ctx)
                    .reply("Something went wrong... A bug report has been sent.")
                    .source(error)
                    .notify(true)
                    .is_error(true)
                    .build()
                    .send()
                    .await;
            }
            FrameworkError::CommandPanic { payload, ctx, .. } => {
                let error = RelayError::Panic { payload };

                Response::builder()
                    .ctx(&ctx)
                    .reply("Something went horribly wrong... A bug report has been sent.")
                    .source(error)
                    .notify(true)
                    .is_error(true)
                    .build()
                    .send()
                    .await;
            }
            FrameworkError::CommandStructureMismatch {
                description, ctx, ..
            } => {
                let error = RelayError::CommandStructureMismatch {
                    description: description.to_string(),
                };

                Response::builder()
                .ctx(&ctx.into())
                .reply("Command structure mismatch. Please wait until discord catches up to a bot update.")
                .source(error)
                .notify(true)
                .is_error(true)
                .build()
                .send()
                .await;
            }

            // ---
            // This section includes errors that should be unreachable.
            // No response is necessary but an error! log can be written.
            // ---
            FrameworkError::UnknownCommand { .. } => {
                error!("Prefix commands are not supported.")
            }
            FrameworkError::UnknownInteraction { interaction, .. } => {
                let name = &interaction.data.name;
                error!("Received unknown interaction: {name}")
            }
            other => error!("Unhandled framework error: {other}"),
        }
    };

    Box::pin(handler)
}

/// Sends an ephemeral reply to the [Context] author.
async fn ephemeral_reply(ctx: &Context<'_>, content: impl Into<String>) {
    let reply = CreateReply::default().ephemeral(true).content(content);
    if let Err(e) = ctx.send(reply).await {
        error!("Failed to send ephemeral reply. {e}")
    };
}

/// Sends a notification (via private message) to users in the notify list (see [Config::notify_list]).
/// If message fails, only log and don't retry.
async fn notify_bug(ctx: &Context<'_>, content: impl Into<String>) {
    let message = CreateMessage::new().content(content);

    let notify_list = &ctx.data().notify_list;
    for user in notify_list {
        if let Err(e) = user.direct_message(ctx, message.clone()).await {
            error!("Failed to send bug notification. {e}");
        }
    }
}

/// Helper function to create debug information from [Context]
fn debug_info(ctx: &Context) -> String {
    let user = &ctx.author().name;
    let cmd = &ctx.command().name;
    let user_input = ctx.invocation_string();
    format!("{user} tried to use {cmd} with {user_input}.")
}

/// Structured response to errors.
/// Always logs as at least [debug level](tracing::debug), but is upgraded to
/// [error level](tracing::error) if `error` is `Some(...)`.
/// Additionally, notify messages are accompanied by [debug info](debug_info).
#[derive(bon::Builder)]
#[builder(on(String, into))]
struct Response<'a> {
    /// The context of the response
    ctx: &'a Context<'a>,
    /// The reason for this reply, usually the error causing the response.
    #[builder(into)]
    source: RelayError,
    /// Optional ephemeral reply to user.
    reply: Option<String>,
    /// Set to `true` to log as error.
    #[builder(default = false)]
    is_error: bool,
    /// Set to `true` to send notifications of the error.
    /// Does nothing if `is_error` is false.
    #[builder(default = false)]
    notify: bool,
}

impl Response<'_> {
    /// Execute the response
    async fn send(&self) {
        let ctx = self.ctx;

        let log_message = self.source.to_string();
        if self.is_error {
            error!("{log_message}");
            if self.notify {
                // Construct and send notification message

                let dbg_info = debug_info(ctx);
                // Format of message
                let content = format!("Debug Info: {dbg_info}\n{log_message}");
                notify_bug(ctx, content).await;
            }
        } else {
            debug!("{log_message}");
        }

        // Send ephemeral reply if there is one.
        if let Some(ref reply) = self.reply {
            ephemeral_reply(ctx, reply).await;
        }
    }
}
