//! LastFM commands.

use async_trait::async_trait;
use serenity::CreateEmbed;
use tracing::instrument;

use crate::error::UserError;
use crate::lastfm;
use crate::lastfm::Track;
use crate::lib::paginate::Buttons;
use crate::lib::paginate::Expire;
use crate::lib::paginate::PageSource;
use crate::lib::paginate::Paginate;
use crate::serenity;
use crate::Context;
use crate::KselonError;

/// set lastfm profile
///
/// usage: `!setlastfm <username>`
#[instrument(skip(ctx))]
#[poise::command(prefix_command, slash_command, category = "fun")]
pub async fn setlastfm(
    ctx: Context<'_>,
    #[description = "Your LastFM username"] username: Option<String>,
) -> Result<(), KselonError> {
    let username = username
        .filter(|name| !name.trim().is_empty())
        .ok_or(UserError::MissingLastFmName)?;

    ctx.data()
        .store
        .set_lastfm(ctx.author().id, &username)
        .await?;
    ctx.say(format!("profile set for {username}!")).await?;
    Ok(())
}

/// One track per page.
struct TrackPages {
    tracks: Vec<Track>,
    username: String,
    scrobbles: Option<String>,
}

#[async_trait]
impl PageSource for TrackPages {
    async fn render(&self, page: usize) -> Result<CreateEmbed, KselonError> {
        let Some(track) = self.tracks.get(page) else {
            return Ok(CreateEmbed::new());
        };
        Ok(lastfm::track_embed(
            track,
            page,
            self.tracks.len(),
            &self.username,
            self.scrobbles.as_deref(),
        ))
    }
}

/// show the currently playing track from LastFM
///
/// usage: `!nowplaying`, `!np <username>`
#[instrument(skip(ctx))]
#[poise::command(
    prefix_command,
    slash_command,
    aliases("np", "lastfm"),
    category = "fun"
)]
pub async fn nowplaying(
    ctx: Context<'_>,
    #[description = "Defaults to your linked profile"] username: Option<String>,
) -> Result<(), KselonError> {
    let data = ctx.data();
    let username = match username.filter(|name| !name.trim().is_empty()) {
        Some(username) => username,
        None => data
            .store
            .get_lastfm(ctx.author().id)
            .await?
            .ok_or(UserError::NoLastFmProfile)?,
    };

    let (tracks, scrobbles) = tokio::join!(
        data.lastfm.recent_tracks(&username),
        data.lastfm.scrobbles(&username)
    );
    let tracks = tracks.unwrap_or_else(|e| {
        tracing::warn!("Error fetching LastFM tracks of {username}: {e}");
        vec![]
    });
    let scrobbles = scrobbles
        .inspect_err(|e| tracing::warn!("Error fetching LastFM info of {username}: {e}"))
        .ok();

    if tracks.is_empty() {
        return Err(UserError::NoRecentTracks { username }.into());
    }

    let source = TrackPages {
        tracks,
        username,
        scrobbles,
    };
    Paginate::builder()
        .pages(source.tracks.len())
        .buttons(Buttons::Full)
        .expire(Expire::DisableButtons)
        .build()
        .run(ctx, &source)
        .await
}
