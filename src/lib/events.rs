//! Gateway events the bot reacts to outside of commands.

use serenity::FullEvent;
use serenity::Member;
use serenity::RoleId;

use crate::data::DEFAULT_PREFIX;
use crate::serenity;
use crate::Data;
use crate::KselonError;

/// Entry point for [poise::FrameworkOptions::event_handler].
pub async fn handle_event(
    ctx: &serenity::Context,
    event: &FullEvent,
    data: &Data,
) -> Result<(), KselonError> {
    match event {
        FullEvent::GuildCreate { guild, is_new } => {
            if *is_new == Some(true) {
                tracing::info!("Joined guild {} ({}).", guild.name, guild.id);
                data.store.set_prefix(guild.id, DEFAULT_PREFIX).await?;
            }

            if let Some((auto_guild, role)) = data.auto_role {
                if auto_guild == guild.id {
                    let members: Vec<&Member> = guild.members.values().collect();
                    give_role(ctx, &members, role).await;
                }
            }
        }
        FullEvent::GuildDelete { incomplete, .. } => {
            // Unavailable guilds are outages, the bot is still in them.
            if !incomplete.unavailable {
                tracing::info!("Removed from guild {}.", incomplete.id);
                data.store.delete_prefix(incomplete.id).await?;
            }
        }
        FullEvent::GuildMemberAddition { new_member } => {
            if let Some((auto_guild, role)) = data.auto_role {
                if auto_guild == new_member.guild_id {
                    give_role(ctx, &[new_member], role).await;
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Whether a member still needs `role`. Bots are left alone.
fn needs_role(bot: bool, roles: &[RoleId], role: RoleId) -> bool {
    !bot && !roles.contains(&role)
}

/// Failures are only logged, one member failing doesn't stop the others.
async fn give_role(ctx: &serenity::Context, members: &[&Member], role: RoleId) {
    for member in members {
        if !needs_role(member.user.bot, &member.roles, role) {
            continue;
        }
        match member.add_role(ctx, role).await {
            Ok(()) => tracing::debug!("Gave role {role} to {}.", member.user.name),
            Err(e) => tracing::warn!("Could not give role {role} to {}: {e}", member.user.name),
        }
    }
}
