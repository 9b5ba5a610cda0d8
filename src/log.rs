//! Logging functionality and error reporting.
//! The logging library of choice is [tracing].

use itertools::Itertools;
use poise::BoxFuture;
use poise::CreateReply;
use poise::FrameworkError;
use serenity::CreateMessage;
use tracing::debug;
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::error::UserError;
use crate::serenity;
use crate::Config;
use crate::Context;
use crate::Data;
use crate::KselonError;

/// The name of this crate, used to set filter target.
const THIS_CRATE: &str = env!("CARGO_CRATE_NAME");

/// Setup format layers, tracing subscribers, and installs tracing.
/// The returned guard must be kept alive for file logs to be written.
pub(super) fn install_tracing(config: &Config) -> Option<WorkerGuard> {
    let debug = config.console_debug();
    // Uses local time.
    let timer = fmt::time::ChronoLocal::rfc_3339();

    // INFO and above for everything, DEBUG for this crate when debugging.
    let mut target = Targets::new().with_default(LevelFilter::INFO);
    if debug {
        target = target.with_target(THIS_CRATE, LevelFilter::DEBUG);
    }

    // Files and line numbers are only shown when debugging.
    let console_layer = fmt::layer()
        .with_ansi(true)
        .with_file(debug)
        .with_level(true)
        .with_line_number(debug)
        .with_target(true)
        .with_timer(timer.clone())
        .pretty()
        .with_filter(target.clone());

    // Same as the console, without colors and on one line.
    let (log_layer, guard) = if config.logs_enabled() {
        // Files are named "{THIS_CRATE}.log.{TIMESTAMP}", one per hour.
        let appender = tracing_appender::rolling::hourly(config.log_dir(), format!("{THIS_CRATE}.log"));
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let layer = fmt::layer()
            .with_ansi(false)
            .with_file(debug)
            .with_level(true)
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

/// Defines various behaviors for how to handle errors.
/// [UserError]s are shown as is, unexpected errors are logged and trigger a [notify_bug].
pub fn handle_framework_error(err: FrameworkError<Data, KselonError>) -> BoxFuture<()> {
    let handler = async move {
        match err {
            // ---
            // Errors that should be invisible to users.
            // ---
            FrameworkError::Setup { error, .. } => error!("Error during startup: {error}"),
            FrameworkError::EventHandler { error, event, .. } => {
                error!(
                    "Error while handling event {}: {error}",
                    event.snake_case_name()
                )
            }
            // Messages starting with the prefix aren't always meant for the bot.
            FrameworkError::UnknownCommand { msg_content, .. } => {
                debug!("Ignoring unknown command: {msg_content}")
            }
            FrameworkError::DynamicPrefix { error, msg, .. } => {
                error!("Could not get the prefix for message {}: {error}", msg.id)
            }
            FrameworkError::UnknownInteraction { interaction, .. } => {
                error!("Received unknown interaction: {}", interaction.data.name)
            }

            // ---
            // Errors users see, but that are part of normal use. Logged at debug level.
            // ---
            FrameworkError::Command {
                error: KselonError::UserError(user_error),
                ctx,
                ..
            } => user_reply(&ctx, user_error).await,
            FrameworkError::SubcommandRequired { ctx } => {
                let subcmds = ctx
                    .command()
                    .subcommands
                    .iter()
                    .map(|s| s.name.as_str())
                    .join(", ");
                user_reply(&ctx, UserError::MissingSubcommand { subcmds }).await;
            }
            FrameworkError::ArgumentParse {
                error, input, ctx, ..
            } => {
                let user_error = UserError::BadArgs { input };
                Response::builder()
                    .ctx(&ctx)
                    .reply(user_error.to_string())
                    .source(user_error)
                    .add_info(error.to_string())
                    .build()
                    .send()
                    .await;
            }
            FrameworkError::CooldownHit {
                remaining_cooldown,
                ctx,
                ..
            } => user_reply(&ctx, UserError::OnCooldown { remaining_cooldown }).await,
            FrameworkError::MissingBotPermissions {
                missing_permissions,
                ctx,
                ..
            } => {
                let user_error = UserError::MissingBotPermissions {
                    missing_permissions,
                };
                user_reply(&ctx, user_error).await;
            }
            FrameworkError::MissingUserPermissions {
                missing_permissions,
                ctx,
                ..
            } => {
                let user_error = UserError::MissingUserPermissions {
                    missing_permissions,
                };
                user_reply(&ctx, user_error).await;
            }
            FrameworkError::NotAnOwner { ctx, .. } => {
                let motd = ctx.data().owner_check_reply();
                user_reply(&ctx, UserError::NotOwner { motd }).await;
            }
            FrameworkError::GuildOnly { ctx, .. } => user_reply(&ctx, UserError::GuildOnly).await,
            FrameworkError::DmOnly { ctx, .. } => user_reply(&ctx, UserError::DmOnly).await,
            FrameworkError::NsfwOnly { ctx, .. } => user_reply(&ctx, UserError::NsfwOnly).await,
            FrameworkError::CommandCheckFailed { error, ctx, .. } => {
                let error = KselonError::CheckFailed {
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
            // Unexpected errors. Users are told, the error is logged and a bug report is sent.
            // ---
            FrameworkError::Command { error, ctx, .. } => {
                Response::builder()
                    .ctx(&ctx)
                    .reply(format!("an error occurred: {error}"))
                    .source(error)
                    .notify(true)
                    .is_error(true)
                    .build()
                    .send()
                    .await;
            }
            FrameworkError::CommandPanic { payload, ctx, .. } => {
                let error = KselonError::Panic { payload };
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
                let error = KselonError::CommandStructureMismatch {
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
            _ => error!("Unhandled framework error."),
        }
    };

    Box::pin(handler)
}

/// Replies with the message of a [UserError].
async fn user_reply(ctx: &Context<'_>, user_error: UserError) {
    Response::builder()
        .ctx(ctx)
        .reply(user_error.to_string())
        .source(user_error)
        .build()
        .send()
        .await;
}

/// Replies to the [Context] author. Slash commands get an ephemeral reply.
async fn reply(ctx: &Context<'_>, content: impl Into<String>) {
    let reply = CreateReply::default().ephemeral(true).content(content);
    if let Err(e) = ctx.send(reply).await {
        error!("Failed to send error reply. {e}")
    };
}

/// Sends a notification (via private message) to users in [Data::notify_list].
/// If message fails, only log and don't retry.
async fn notify_bug(ctx: &Context<'_>, content: impl Into<String>) {
    let message = CreateMessage::new().content(content);

    for user in &ctx.data().notify_list {
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
    let place = ctx
        .guild_id()
        .map_or("DMs".to_string(), |guild| format!("guild {guild}"));
    format!("{user} tried to use {cmd} with {user_input} in {place}.")
}

/// Structured response to errors.
/// Always logs as at least [debug level](tracing::debug), but is upgraded to
/// [error level](tracing::error) if `is_error` is set.
/// Additionally, notify messages are accompanied by [debug info](debug_info).
#[derive(bon::Builder)]
#[builder(on(String, into))]
struct Response<'a> {
    /// The context of the response
    ctx: &'a Context<'a>,
    /// The reason for this reply, usually the error causing the response.
    #[builder(into)]
    source: KselonError,
    /// Optional reply to the user.
    reply: Option<String>,
    /// Additional information to log
    add_info: Option<String>,
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

        let log_message = match &self.add_info {
            Some(info) => format!("{} | {info}", self.source),
            None => self.source.to_string(),
        };

        if self.is_error {
            error!("{log_message}");
            if self.notify {
                let content = format!("Debug Info: {}\n{log_message}", debug_info(ctx));
                notify_bug(ctx, content).await;
            }
        } else {
            debug!("{log_message}");
        }

        if let Some(content) = &self.reply {
            reply(ctx, content).await;
        }
    }
}
