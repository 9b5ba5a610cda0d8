//! Setup for [poise::Framework]

use std::sync::Arc;

use chrono::Utc;
use sysinfo::System;
use tokio::sync::Mutex;

use crate::chat;
use crate::chat::Chat;
use crate::chat::DiscordOutbox;
use crate::chat::OpenAi;
use crate::chat::StartPrompt;
use crate::commands;
use crate::data;
use crate::data::MySqlStore;
use crate::data::Store;
use crate::lastfm::LastFm;
use crate::osu::api::OsuApi;
use crate::osu::calc::Calculator;
use crate::reworks::Reworks;
use crate::serenity;
use crate::wordbomb::Dictionary;
use crate::wordbomb::GameSlots;
use crate::Config;
use crate::Data;
use crate::KselonError;

/// Convenient type alias, only this [poise::Framework] type is used.
type Framework = poise::Framework<Data, KselonError>;

/// Construct a [poise::Framework]
pub(super) fn framework(config: Config) -> Framework {
    poise::Framework::builder()
        .options(framework_options(&config))
        .setup(|ctx, rdy, fw| framework_setup(ctx, rdy, fw, config))
        .build()
}

/// Configure options for the [Framework]
fn framework_options(config: &Config) -> poise::FrameworkOptions<Data, KselonError> {
    poise::FrameworkOptions {
        // Add commands to the framework
        commands: commands::list(),
        // Prefixes are stored per guild, DMs use the default one.
        prefix_options: poise::PrefixFrameworkOptions {
            dynamic_prefix: Some(|ctx| {
                Box::pin(async move {
                    let prefix = data::prefix_for(ctx.data.store.as_ref(), ctx.guild_id).await;
                    Ok(Some(prefix))
                })
            }),
            mention_as_prefix: true,
            case_insensitive_commands: true,
            ..Default::default()
        },
        // The application owner is added on startup.
        owners: config.owners(),
        // Handle framework errors
        on_error: |e| crate::log::handle_framework_error(e),
        // Guild joins, leaves and new members
        event_handler: |ctx, event, _fw, data| {
            Box::pin(crate::lib::events::handle_event(ctx, event, data))
        },
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

/// Construct future that runs on startup
fn framework_setup<'a>(
    ctx: &'a serenity::Context,
    rdy: &'a serenity::Ready,
    fw: &'a Framework,
    config: Config,
) -> poise::BoxFuture<'a, Result<Data, KselonError>> {
    Box::pin(async move {
        // Register the commands
        let commands = &commands::list();
        let app_commands = poise::builtins::create_application_commands(commands);

        serenity::Command::set_global_commands(&ctx, app_commands.clone()).await?;
        if let Some(dev_guild) = config.dev_guild() {
            // This is faster than global registers, useful for development.
            tracing::info!("Registering commands on dev guild.");
            dev_guild.set_commands(ctx, app_commands).await?;
        }

        // Client internally uses an Arc, every API shares its connections.
        let http = reqwest::Client::new();

        let store: Arc<dyn Store> = Arc::new(MySqlStore::connect(&config.database).await);
        data::spawn_health_check(store.clone(), config.database.health_check_interval());

        let start_prompt = StartPrompt {
            enabled: config.llm.use_start_prompt,
            text: read_start_prompt(&config.llm.start_prompt_file).await,
            channel: config.llm.start_prompt_channel,
        };
        let provider = Arc::new(OpenAi::new(http.clone(), &config.llm));
        let (chat, queue) = Chat::new(provider, start_prompt);
        let outbox = DiscordOutbox {
            http: ctx.http.clone(),
        };
        tokio::spawn(chat::run_worker(chat.clone(), queue, outbox));
        tokio::spawn(greet(chat.clone(), ctx.http.clone()));

        let data = Data {
            notify_list: config.notify_list(fw),
            owner_check_motd: config.owner_check_motd().to_vec(),
            store,
            osu: OsuApi::new(http.clone(), &config.osu.server, &config.osu.api_key),
            calculator: Calculator::new(http.clone(), &config.osu.beatmap_cache),
            lastfm: LastFm::new(http.clone(), &config.lastfm.api_key),
            reworks: Reworks::new(http.clone(), &config.reworks.url),
            chat,
            dictionary: Dictionary::new(http),
            wordbomb: GameSlots::default(),
            started_at: Utc::now(),
            system: Mutex::new(System::new()),
            auto_role: config.auto_role.target(),
        };

        // Simple message that logs when the bot has initialized
        let bot_name = &rdy.user.name;
        tracing::info!("{bot_name} is ready!");

        Ok(data)
    })
}

/// A missing prompt file means no start prompt.
async fn read_start_prompt(path: &str) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            tracing::info!("No start prompt read from {path}: {e}");
            String::new()
        }
    }
}

/// Sends the start prompt and posts the answer, without holding up the startup.
async fn greet(chat: Chat, http: Arc<serenity::Http>) {
    match chat.send_start_prompt().await {
        Ok(Some(answer)) => {
            if let Err(e) = chat.post_to_prompt_channel(&http, &answer).await {
                tracing::warn!("Could not post the start prompt answer: {e}");
            }
        }
        Ok(None) => {}
        Err(e) => tracing::error!("Start prompt failed: {e}"),
    }
}
