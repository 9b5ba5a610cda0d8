//! Implements `recent` and `top`.

use async_trait::async_trait;
use futures::future;
use serenity::CreateEmbed;
use tracing::instrument;

use super::resolve_player;
use crate::error::UserError;
use crate::lib::paginate::page_count;
use crate::lib::paginate::PageSource;
use crate::lib::paginate::Paginate;
use crate::osu::api::Score;
use crate::osu::api::ScoreScope;
use crate::osu::api::Target;
use crate::osu::calc::Calculator;
use crate::osu::embeds;
use crate::osu::embeds::ServerLinks;
use crate::osu::embeds::TOP_PAGE_SIZE;
use crate::serenity;
use crate::Context;
use crate::KselonError;

/// Scores of one player, drawn as `recent` or `top` pages.
struct ScorePages<'a> {
    scope: ScoreScope,
    scores: Vec<Score>,
    username: String,
    calculator: &'a Calculator,
    links: ServerLinks<'a>,
}

impl ScorePages<'_> {
    fn per_page(&self) -> usize {
        match self.scope {
            ScoreScope::Recent => 1,
            ScoreScope::Best => TOP_PAGE_SIZE,
        }
    }

    fn pages(&self) -> usize {
        page_count(self.scores.len(), self.per_page())
    }
}

#[async_trait]
impl PageSource for ScorePages<'_> {
    async fn render(&self, page: usize) -> Result<CreateEmbed, KselonError> {
        let per_page = self.per_page();
        let mut shown = self.scores.iter().skip(page * per_page).take(per_page);

        match self.scope {
            ScoreScope::Recent => {
                let Some(score) = shown.next() else {
                    return Ok(CreateEmbed::new());
                };
                let calc = self.calculator.calculate_score(score).await?;
                Ok(embeds::recent_embed(score, &calc, self.links))
            }
            ScoreScope::Best => {
                let scores: Vec<&Score> = shown.collect();
                // Beatmaps of a page are downloaded and calculated together.
                let calcs = future::try_join_all(
                    scores
                        .iter()
                        .map(|score| self.calculator.calculate_score(score)),
                )
                .await?;

                let fields = scores
                    .iter()
                    .zip(&calcs)
                    .enumerate()
                    .map(|(i, (score, calc))| {
                        embeds::top_field(score, calc, page * per_page + i + 1, self.links)
                    })
                    .collect();
                Ok(embeds::top_embed(
                    &self.username,
                    fields,
                    page,
                    self.pages(),
                    self.links,
                ))
            }
        }
    }
}

/// Line above the embed, e.g. `Best scores for ano:`.
fn heading(scope: ScoreScope, player: &str) -> String {
    match scope {
        ScoreScope::Recent => format!("Recent score for {player}:"),
        ScoreScope::Best => format!("Best scores for {player}:"),
    }
}

async fn show_scores(
    ctx: Context<'_>,
    args: Option<String>,
    scope: ScoreScope,
) -> Result<(), KselonError> {
    let (username, mode) = resolve_player(ctx, args.as_deref()).await?;
    let data = ctx.data();
    let osu = &data.osu;

    let response = match osu
        .get_player_scores(scope, &Target::Name(username.clone()), None, Some(mode))
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
            ctx.say(format!("failed to fetch scores: {e}")).await?;
            return Ok(());
        }
    };

    if response.status != "success" {
        return Err(UserError::ScoresUnavailable.into());
    }
    if response.scores.is_empty() {
        return Err(UserError::NoScores {
            scope: scope.as_str().to_string(),
        }
        .into());
    }
    let Some(player) = response.player else {
        return Err(UserError::ScoresUnavailable.into());
    };

    let source = ScorePages {
        scope,
        scores: response.scores,
        username,
        calculator: &data.calculator,
        links: ServerLinks {
            server: osu.server(),
            player_id: player.id,
        },
    };

    Paginate::builder()
        .pages(source.pages())
        .content(heading(scope, &player.name))
        .build()
        .run(ctx, &source)
        .await
}

/// get player's most recent scores
///
/// usage: `!r ano +rx!std`, `!r @rieki +vn!ctb`, `!r +vn!std`
#[instrument(skip(ctx))]
#[poise::command(
    prefix_command,
    slash_command,
    aliases("r", "rs"),
    category = "osu"
)]
pub async fn recent(
    ctx: Context<'_>,
    #[rest]
    #[description = "@user, name, +mode or name +mode"]
    args: Option<String>,
) -> Result<(), KselonError> {
    show_scores(ctx, args, ScoreScope::Recent).await
}

/// get player's top scores
///
/// usage: `!t ano +ap!std`, `!t +rx!std`, `!t @nipa +vn!std`
#[instrument(skip(ctx))]
#[poise::command(
    prefix_command,
    slash_command,
    aliases("t", "osutop"),
    category = "osu"
)]
pub async fn top(
    ctx: Context<'_>,
    #[rest]
    #[description = "@user, name, +mode or name +mode"]
    args: Option<String>,
) -> Result<(), KselonError> {
    show_scores(ctx, args, ScoreScope::Best).await
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn headings_name_the_scope() {
        assert_eq!(heading(ScoreScope::Recent, "ano"), "Recent score for ano:");
        assert_eq!(heading(ScoreScope::Best, "ano"), "Best scores for ano:");
    }
}
