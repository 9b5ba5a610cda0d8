//! Implements `setprofile` and `profile`.

use poise::CreateReply;
use serenity::CreateEmbed;
use tracing::instrument;

use super::resolve_player;
use crate::data::Profile;
use crate::error::UserError;
use crate::lib;
use crate::osu::api::PlayerDetails;
use crate::osu::api::PlayerStats;
use crate::osu::api::Target;
use crate::osu::Mode;
use crate::serenity;
use crate::Context;
use crate::KselonError;

/// set your in-game username and mode.
///
/// usage: `!setprofile <username> <mode>`
#[instrument(skip(ctx))]
#[poise::command(prefix_command, slash_command, category = "osu")]
pub async fn setprofile(
    ctx: Context<'_>,
    #[description = "Your in-game username"] username: Option<String>,
    #[description = "Your default mode, e.g. rx!std"] mode: Option<String>,
) -> Result<(), KselonError> {
    let (Some(username), Some(mode)) = (username, mode) else {
        return Err(UserError::MissingProfileArgs.into());
    };

    let profile = Profile {
        name: username,
        mode: Mode::parse(&mode),
    };
    ctx.data()
        .store
        .set_profile(ctx.author().id, &profile)
        .await?;

    ctx.say(format!("profile set for {} in mode {mode}.", profile.name))
        .await?;
    Ok(())
}

fn performance_field(info: &PlayerDetails, stats: &PlayerStats, show_xp: bool) -> String {
    let xp = match (show_xp, stats.xp) {
        (true, Some(xp)) => format!("**xp:** {xp}\n"),
        _ => String::new(),
    };

    format!(
        "**pp:** {}pp\n\
         {xp}\
         **accuracy:** {:.2}%\n\
         **global rank:** #{} (:flag_{}:, #{})\n\
         **playcount:** {}\n\
         **playtime:** {}\n\
         **grades:** <:rank_x:1278891650520842362> {} | <:grade_ssh:1251961164225581207> {} \
         | <:grade_sh:1251961168763945102> {} | <:grade_s:1251961171335188551> {} \
         | <:grade_a:1239381666552877056> {}",
        lib::separated(stats.pp.round() as i64),
        stats.acc,
        lib::separated(stats.rank as i64),
        info.country.to_lowercase(),
        stats.country_rank,
        lib::separated(stats.plays as i64),
        lib::format_playtime(stats.playtime),
        stats.xh_count,
        stats.x_count,
        stats.sh_count,
        stats.s_count,
        stats.a_count,
    )
}

fn general_field(info: &PlayerDetails) -> String {
    format!(
        "**account created:** {}\n**last seen:** {}",
        lib::timestamp(info.creation_time, 'R'),
        lib::timestamp(info.latest_activity, 'R'),
    )
}

/// get player profile
///
/// usage: `!pf <username> (mode)`, `!pf +rx!std`, `!pf @rieki`
#[instrument(skip(ctx))]
#[poise::command(
    prefix_command,
    slash_command,
    aliases("pf", "osu"),
    category = "osu"
)]
pub async fn profile(
    ctx: Context<'_>,
    #[rest]
    #[description = "@user, name, +mode or name +mode"]
    args: Option<String>,
) -> Result<(), KselonError> {
    let (username, mode) = resolve_player(ctx, args.as_deref()).await?;
    let osu = &ctx.data().osu;

    let response = match osu
        .get_player_info("all", &Target::Name(username.clone()))
        .await
    {
        Ok(Some(response)) => response,
        Ok(None) => {
            return Err(UserError::PlayerNotFound {
                name: username,
                server: osu.server().to_string(),
            }
            .into())
        }
        Err(e) => {
            ctx.say(format!("error getting profile. {e}")).await?;
            return Ok(());
        }
    };

    let player = &response.player;
    let stats = player.stats_for(mode).ok_or(UserError::NoModeStats)?;
    let info = &player.info;
    let server = osu.server();

    let embed = CreateEmbed::new()
        .title(format!("{}'s {mode} profile", info.name))
        .url(format!("https://{server}/u/{}", info.id))
        .colour(rand::random::<u32>() & 0xFFFFFF)
        .thumbnail(format!("https://a.{server}/{}", info.id))
        .field("performance", performance_field(info, stats, osu.is_refx()), false)
        .field("general Info", general_field(info), false)
        .image(format!("https://{server}/banners/{}", info.id));

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn details() -> PlayerDetails {
        PlayerDetails {
            id: 3,
            name: "ano".to_string(),
            country: "PH".to_string(),
            creation_time: 1600000000,
            latest_activity: 1700000000,
        }
    }

    fn stats(xp: Option<f64>) -> PlayerStats {
        PlayerStats {
            pp: 12345.0,
            acc: 98.7654,
            rank: 1234,
            country_rank: 5,
            plays: 98765,
            playtime: 90061,
            xh_count: 1,
            x_count: 2,
            sh_count: 3,
            s_count: 4,
            a_count: 5,
            xp,
        }
    }

    #[test]
    fn performance_without_xp() {
        let field = performance_field(&details(), &stats(Some(10.0)), false);

        assert!(field.starts_with(
            "**pp:** 12,345pp\n**accuracy:** 98.77%\n**global rank:** #1,234 (:flag_ph:, #5)\n\
             **playcount:** 98,765\n**playtime:** 1d 1h 1m 1s\n"
        ));
        assert!(field.ends_with("<:grade_a:1239381666552877056> 5"));
    }

    #[test]
    fn performance_with_xp() {
        let field = performance_field(&details(), &stats(Some(4200.5)), true);

        assert!(field.starts_with("**pp:** 12,345pp\n**xp:** 4200.5\n**accuracy:**"));
    }

    #[test]
    fn general_uses_relative_times() {
        assert_eq!(
            general_field(&details()),
            "**account created:** <t:1600000000:R>\n**last seen:** <t:1700000000:R>"
        );
    }
}
