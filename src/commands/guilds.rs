//! Per guild prefixes for text commands.

use tracing::instrument;

use crate::data::validate_prefix;
use crate::data::DEFAULT_PREFIX;
use crate::error::UserError;
use crate::Context;
use crate::KselonError;

/// change the bot's prefix for this server
///
/// usage: `!setprefix <new_prefix>`, at most 3 characters.
#[instrument(skip(ctx))]
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    category = "guilds"
)]
pub async fn setprefix(ctx: Context<'_>, new_prefix: String) -> Result<(), KselonError> {
    let guild = ctx.guild_id().ok_or(UserError::GuildOnly)?;
    validate_prefix(&new_prefix)?;

    ctx.data().store.set_prefix(guild, &new_prefix).await?;
    ctx.say(format!("prefix has been changed to: `{new_prefix}`"))
        .await?;
    Ok(())
}

/// show the current prefix for this server
#[instrument(skip(ctx))]
#[poise::command(prefix_command, slash_command, category = "guilds")]
pub async fn prefix(ctx: Context<'_>) -> Result<(), KselonError> {
    let current = crate::data::prefix_for(ctx.data().store.as_ref(), ctx.guild_id()).await;
    ctx.say(format!("current prefix is: `{current}`")).await?;
    Ok(())
}

/// reset the prefix to the default
#[instrument(skip(ctx))]
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    category = "guilds"
)]
pub async fn resetprefix(ctx: Context<'_>) -> Result<(), KselonError> {
    let guild = ctx.guild_id().ok_or(UserError::GuildOnly)?;

    ctx.data().store.set_prefix(guild, DEFAULT_PREFIX).await?;
    ctx.say(format!("prefix has been reset to: `{DEFAULT_PREFIX}`"))
        .await?;
    Ok(())
}
