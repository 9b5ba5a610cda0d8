//! Implements the `wordbomb` command.

use serenity::EditMessage;
use serenity::Mentionable;
use serenity::Message;
use serenity::MessageCollector;
use tracing::instrument;

use crate::error::UserError;
use crate::serenity;
use crate::wordbomb;
use crate::wordbomb::Game;
use crate::Context;
use crate::KselonError;

const DEFAULT_TIME_LIMIT: u64 = 60;

fn start_message(time_limit: u64) -> String {
    format!(
        "word bomb started!\n\
         time limit: {time_limit} seconds\n\
         rules: words must contain at least {} characters in sequence from the current word\n",
        wordbomb::MIN_SEQUENCE
    )
}

/// start a word bomb game that continues till the time runs out.
///
/// When a player wins with a valid word, that word becomes the next target.
/// The time limit is in seconds.
///
/// usage: `!wordbomb 32`
#[instrument(skip(ctx))]
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("wb"),
    category = "fun"
)]
pub async fn wordbomb(
    ctx: Context<'_>,
    #[description = "Game length in seconds, 60 by default"]
    #[min = 1]
    #[max = 3600]
    time_limit: Option<u64>,
) -> Result<(), KselonError> {
    let guild = ctx.guild_id().ok_or(UserError::GuildOnly)?;
    let time_limit = time_limit.unwrap_or(DEFAULT_TIME_LIMIT);
    let duration = wordbomb::check_time_limit(time_limit)?;
    let _slot = ctx
        .data()
        .wordbomb
        .try_claim(guild)
        .ok_or(UserError::GameInProgress)?;

    let loading = ctx.say("starting game...").await?;
    let mut game = Game::new(wordbomb::random_word(), duration);
    let mut board = ctx
        .channel_id()
        .say(ctx, start_message(time_limit))
        .await?;
    if let Err(e) = loading.delete(ctx).await {
        tracing::debug!("Could not delete the loading message: {e}");
    }

    let result = play(ctx, &mut game, &mut board).await;

    // The scores are always shown, even if the game broke down.
    ctx.channel_id().say(ctx, game.final_board()).await?;
    result
}

/// Runs the game until the time is up.
async fn play(ctx: Context<'_>, game: &mut Game, board: &mut Message) -> Result<(), KselonError> {
    let channel = ctx.channel_id();
    let dictionary = &ctx.data().dictionary;

    loop {
        let remaining = game.remaining();
        if remaining.as_secs() == 0 {
            break;
        }
        board
            .edit(ctx, EditMessage::new().content(game.status()))
            .await?;

        let rules = game.rules();
        let collected = MessageCollector::new(ctx)
            .channel_id(channel)
            .filter(move |msg| !msg.author.bot && rules(&msg.content).is_some())
            .timeout(remaining)
            .await;

        let Some(msg) = collected else {
            channel.say(ctx, "times up!").await?;
            continue;
        };
        let Some(word) = game.candidate(&msg.content) else {
            continue;
        };

        if !dictionary.is_english_word(&word).await {
            msg.react(ctx, '❌').await?;
            continue;
        }

        let points = game.accept(msg.author.id, &msg.author.name, &word);
        msg.react(ctx, '✅').await?;
        channel
            .say(
                ctx,
                format!(
                    "✨ {} earned {points} points with \"{word}\"!",
                    msg.author.mention()
                ),
            )
            .await?;
    }
    Ok(())
}
