//! Implements `changemod`.

use poise::CreateReply;
use serenity::Attachment;
use serenity::CreateAttachment;
use tracing::instrument;

use crate::error::UserError;
use crate::osu::replay;
use crate::osu::replay::ReplayHeader;
use crate::osu::Mods;
use crate::serenity;
use crate::Context;
use crate::KselonError;

/// change the mods of a replay file
///
/// usage: `!changemod hddt` with a `.osr` file attached.
#[instrument(skip(ctx, replay))]
#[poise::command(
    prefix_command,
    slash_command,
    aliases("cm", "rp"),
    category = "osu"
)]
pub async fn changemod(
    ctx: Context<'_>,
    #[description = "The .osr replay"] replay: Option<Attachment>,
    #[rest]
    #[description = "Mods to apply, e.g. hddt"]
    mods: Option<String>,
) -> Result<(), KselonError> {
    let replay = replay.ok_or(UserError::MissingReplay)?;
    if !replay.filename.ends_with(".osr") {
        return Err(UserError::NotAReplay.into());
    }
    let input = mods
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or(UserError::MissingMods)?;
    let new_mods = Mods::from_replay_acronyms(&input)?;

    let bytes = replay.download().await?;
    let header = ReplayHeader::parse(&bytes)?;
    tracing::debug!(
        "Changing mods of {}'s replay on {} from {} to {new_mods}.",
        header.player,
        header.beatmap_md5,
        header.mods
    );
    let rewritten = replay::with_mods(&bytes, new_mods)?;

    let file = CreateAttachment::bytes(rewritten, format!("new_{}", replay.filename));
    let reply = CreateReply::default()
        .content(format!(
            "changed mods to {} (value: {}):",
            input.to_uppercase(),
            new_mods.bits()
        ))
        .attachment(file);
    ctx.send(reply).await?;
    Ok(())
}
