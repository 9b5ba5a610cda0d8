//! Commands only the owners can use.

use tracing::instrument;

use crate::error::UserError;
use crate::serenity;
use crate::Context;
use crate::KselonError;

/// Longest guild list sent as one message.
const MAX_LIST_LEN: usize = 1990;
/// Guilds per message once the list is split.
const GUILDS_PER_PAGE: usize = 20;

/// shuts down the bot
#[instrument(skip(ctx))]
#[poise::command(prefix_command, owners_only, hide_in_help, aliases("stop"), category = "owner")]
pub async fn shutdown(ctx: Context<'_>) -> Result<(), KselonError> {
    tracing::warn!("Shutdown requested by {}.", ctx.author().name);
    ctx.say("shutting down...").await?;
    ctx.framework().shard_manager().shutdown_all().await;
    Ok(())
}

/// The messages listing `lines`, split in pages when they don't fit in one.
fn guild_list_messages(lines: &[String]) -> Vec<String> {
    let joined = lines.join("\n");
    if joined.len() <= MAX_LIST_LEN {
        return vec![format!("**guilds:**\n```{joined}```")];
    }

    let pages = lines.chunks(GUILDS_PER_PAGE).collect::<Vec<_>>();
    pages
        .iter()
        .enumerate()
        .map(|(i, page)| {
            format!(
                "**guilds (Page {}/{}):**\n```{}```",
                i + 1,
                pages.len(),
                page.join("\n")
            )
        })
        .collect()
}

/// lists all guilds the bot is in
#[instrument(skip(ctx))]
#[poise::command(prefix_command, owners_only, hide_in_help, category = "owner")]
pub async fn guilds(ctx: Context<'_>) -> Result<(), KselonError> {
    let cache = ctx.cache();
    let lines = cache
        .guilds()
        .into_iter()
        .filter_map(|id| {
            let guild = cache.guild(id)?;
            Some(format!(
                "{} (ID: {id}, Members: {})",
                guild.name, guild.member_count
            ))
        })
        .collect::<Vec<_>>();

    for message in guild_list_messages(&lines) {
        ctx.say(message).await?;
    }
    Ok(())
}

/// leave a specific guild by ID
#[instrument(skip(ctx))]
#[poise::command(
    prefix_command,
    owners_only,
    hide_in_help,
    aliases("leave_guild"),
    category = "owner"
)]
pub async fn leaveguild(ctx: Context<'_>, guild_id: u64) -> Result<(), KselonError> {
    let not_found = UserError::GuildNotFound { id: guild_id };
    if guild_id == 0 {
        return Err(not_found.into());
    }

    let id = serenity::GuildId::new(guild_id);
    let name = ctx
        .cache()
        .guild(id)
        .map(|guild| guild.name.clone())
        .ok_or(not_found)?;

    ctx.say(format!("leaving guild: {name} (ID: {guild_id})"))
        .await?;
    id.leave(ctx).await?;
    tracing::warn!("Left guild: {name} (ID: {guild_id})");
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn lines(count: usize, name_len: usize) -> Vec<String> {
        (0..count)
            .map(|i| format!("{} (ID: {i}, Members: 3)", "g".repeat(name_len)))
            .collect()
    }

    #[test]
    fn short_lists_fit_in_one_message() {
        let messages = guild_list_messages(&lines(2, 4));

        assert_eq!(
            messages,
            ["**guilds:**\n```gggg (ID: 0, Members: 3)\ngggg (ID: 1, Members: 3)```"]
        );
    }

    #[test]
    fn long_lists_are_split_by_twenty() {
        let messages = guild_list_messages(&lines(45, 60));

        assert_eq!(messages.len(), 3);
        assert!(messages[0].starts_with("**guilds (Page 1/3):**\n```"));
        assert!(messages[2].starts_with("**guilds (Page 3/3):**\n```"));
        assert_eq!(messages[2].matches("Members").count(), 5);
    }
}
