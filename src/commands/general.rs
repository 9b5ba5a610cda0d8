//! Information about server members.

use std::borrow::Cow;

use poise::CreateReply;
use serenity::CreateEmbed;
use serenity::CreateEmbedAuthor;
use serenity::Member;
use tracing::instrument;

use crate::error::UserError;
use crate::lib;
use crate::serenity;
use crate::Context;
use crate::KselonError;

/// The given member, or the author of the command.
async fn member_or_author(
    ctx: Context<'_>,
    member: Option<Member>,
) -> Result<Member, KselonError> {
    if let Some(member) = member {
        return Ok(member);
    }
    let author = ctx.author_member().await.ok_or(UserError::GuildOnly)?;
    Ok(Cow::into_owned(author))
}

/// Role names without `@everyone`, sorted.
fn role_names(mut names: Vec<String>) -> Vec<String> {
    names.retain(|name| name != "@everyone");
    names.sort();
    names
}

/// `<t:N:F>` with the relative time under it.
fn both_timestamps(unix: i64) -> String {
    format!(
        "{}\n({})",
        lib::timestamp(unix, 'F'),
        lib::timestamp(unix, 'R')
    )
}

/// show an user's information
///
/// usage: `!user @rieki`
#[instrument(skip(ctx))]
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("user", "ui"),
    category = "general"
)]
pub async fn userinfo(
    ctx: Context<'_>,
    #[description = "Defaults to you"] member: Option<Member>,
) -> Result<(), KselonError> {
    let member = member_or_author(ctx, member).await?;
    let user = &member.user;

    let roles = role_names(
        member
            .roles(ctx.serenity_context())
            .unwrap_or_default()
            .into_iter()
            .map(|role| role.name)
            .collect(),
    );
    let roles_value = if roles.is_empty() {
        "None".to_string()
    } else {
        roles.join(", ")
    };

    let mut embed = CreateEmbed::new()
        .field("user id", user.id.to_string(), true)
        .field("nickname", member.nick.as_deref().unwrap_or("None"), true)
        .field(
            "joined discord",
            both_timestamps(user.created_at().unix_timestamp()),
            false,
        );
    if let Some(joined) = member.joined_at {
        embed = embed.field(
            "joined server",
            both_timestamps(joined.unix_timestamp()),
            false,
        );
    }
    embed = embed.field(format!("roles ({})", roles.len()), roles_value, false);

    if let Some(colour) = member.colour(ctx.serenity_context()) {
        embed = embed.colour(colour);
    }
    embed = match user.avatar_url() {
        Some(avatar) => embed
            .author(
                CreateEmbedAuthor::new(format!("{} | {}", user.name, member.display_name()))
                    .url(&avatar),
            )
            .thumbnail(avatar),
        None => embed.author(CreateEmbedAuthor::new(&user.name)),
    };

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// shows user avatar
///
/// usage: `!av @nipa`
#[instrument(skip(ctx))]
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("av"),
    category = "general"
)]
pub async fn avatar(
    ctx: Context<'_>,
    #[description = "Defaults to you"] member: Option<Member>,
) -> Result<(), KselonError> {
    let member = member_or_author(ctx, member).await?;
    let avatar = member.face();

    let mut embed = CreateEmbed::new()
        .author(
            CreateEmbedAuthor::new(format!("{}'s avatar:", member.user.name))
                .url(&avatar)
                .icon_url(&avatar),
        )
        .image(&avatar);
    if let Some(colour) = member.colour(ctx.serenity_context()) {
        embed = embed.colour(colour);
    }

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn roles_are_sorted_without_everyone() {
        let names = ["mod", "@everyone", "admin"].map(str::to_string).to_vec();

        assert_eq!(role_names(names), ["admin", "mod"]);
    }

    #[test]
    fn timestamps_show_both_styles() {
        assert_eq!(both_timestamps(5), "<t:5:F>\n(<t:5:R>)");
    }
}
